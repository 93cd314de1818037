//! Seat map and the two-seat selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Seats every booking must pick
pub const SEATS_PER_BOOKING: usize = 2;

/// Seat selection problems
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeatSelectionError {
    /// Seat label did not parse
    #[error("invalid seat identifier: {0:?}")]
    Invalid(String),

    /// Wrong number of seats
    #[error("Please select exactly 2 seats to continue")]
    WrongCount(usize),

    /// Same seat picked twice
    #[error("seat {0} selected more than once")]
    Duplicate(Seat),

    /// Seat already taken
    #[error("seat {0} is occupied")]
    Occupied(Seat),

    /// Seat outside the cabin
    #[error("seat {0} is not on the seat map")]
    OutsideMap(Seat),
}

/// Seat letter; the aisle runs between C and D
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeatColumn {
    /// Window
    A,
    /// Middle
    B,
    /// Aisle
    C,
    /// Aisle
    D,
    /// Middle
    E,
    /// Window
    F,
}

impl SeatColumn {
    /// Columns left to right
    pub const ALL: [Self; 6] = [Self::A, Self::B, Self::C, Self::D, Self::E, Self::F];

    /// Letter shown on the map
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
        }
    }

    /// Parse an upper- or lower-case letter
    #[must_use]
    pub const fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            'E' => Some(Self::E),
            'F' => Some(Self::F),
            _ => None,
        }
    }
}

/// A seat, e.g. `12C`
///
/// Serialized as its label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Seat {
    /// Row number, 1-based
    pub row: u8,
    /// Seat letter
    pub column: SeatColumn,
}

impl Seat {
    /// Seat at row and column
    #[must_use]
    pub const fn new(row: u8, column: SeatColumn) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.column.letter())
    }
}

impl FromStr for Seat {
    type Err = SeatSelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SeatSelectionError::Invalid(s.to_string());
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let column = chars
            .next_back()
            .and_then(SeatColumn::from_letter)
            .ok_or_else(invalid)?;
        let row: u8 = chars.as_str().parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }
        Ok(Self::new(row, column))
    }
}

impl TryFrom<String> for Seat {
    type Error = SeatSelectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Seat> for String {
    fn from(seat: Seat) -> Self {
        seat.to_string()
    }
}

const fn seat(row: u8, column: SeatColumn) -> Seat {
    Seat::new(row, column)
}

/// Seats sold before the session started
pub const OCCUPIED_SEATS: [Seat; 8] = [
    seat(1, SeatColumn::A),
    seat(1, SeatColumn::F),
    seat(2, SeatColumn::B),
    seat(3, SeatColumn::E),
    seat(4, SeatColumn::C),
    seat(7, SeatColumn::D),
    seat(8, SeatColumn::A),
    seat(10, SeatColumn::F),
];

/// Cabin layout and occupancy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeatMap {
    rows: u8,
    occupied: &'static [Seat],
}

impl Default for SeatMap {
    fn default() -> Self {
        Self::standard()
    }
}

impl SeatMap {
    /// The 14-row cabin with the fixed occupied seats
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            rows: 14,
            occupied: &OCCUPIED_SEATS,
        }
    }

    /// Number of rows
    #[must_use]
    pub const fn rows(&self) -> u8 {
        self.rows
    }

    /// Whether the seat exists in this cabin
    #[must_use]
    pub const fn contains(&self, seat: Seat) -> bool {
        seat.row >= 1 && seat.row <= self.rows
    }

    /// Whether the seat is already taken
    #[must_use]
    pub fn is_occupied(&self, seat: Seat) -> bool {
        self.occupied.contains(&seat)
    }

    /// On the map and free
    #[must_use]
    pub fn is_available(&self, seat: Seat) -> bool {
        self.contains(seat) && !self.is_occupied(seat)
    }

    /// Every seat row by row, left to right
    pub fn seats(&self) -> impl Iterator<Item = Seat> + '_ {
        (1..=self.rows).flat_map(|row| SeatColumn::ALL.into_iter().map(move |column| Seat::new(row, column)))
    }

    /// Check a finished selection
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a count other than two, a duplicate,
    /// a seat off the map or an occupied seat.
    pub fn check_selection(&self, seats: &[Seat]) -> Result<[Seat; SEATS_PER_BOOKING], SeatSelectionError> {
        let [first, second] = seats else {
            return Err(SeatSelectionError::WrongCount(seats.len()));
        };
        if first == second {
            return Err(SeatSelectionError::Duplicate(*first));
        }
        for seat in [*first, *second] {
            if !self.contains(seat) {
                return Err(SeatSelectionError::OutsideMap(seat));
            }
            if self.is_occupied(seat) {
                return Err(SeatSelectionError::Occupied(seat));
            }
        }
        Ok([*first, *second])
    }
}

/// Seats picked so far on the seat map
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeatSelection {
    map: SeatMap,
    seats: Vec<Seat>,
}

impl SeatSelection {
    /// Empty selection on a map
    #[must_use]
    pub const fn new(map: SeatMap) -> Self {
        Self {
            map,
            seats: Vec::new(),
        }
    }

    /// Seats in the order they were picked
    #[must_use]
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    /// Click on a seat
    ///
    /// Selecting a selected seat deselects it. Occupied or off-map seats and
    /// a third distinct seat are ignored. Returns whether anything changed.
    pub fn toggle(&mut self, seat: Seat) -> bool {
        if !self.map.is_available(seat) {
            return false;
        }
        if let Some(position) = self.seats.iter().position(|s| *s == seat) {
            self.seats.remove(position);
            return true;
        }
        if self.seats.len() >= SEATS_PER_BOOKING {
            return false;
        }
        self.seats.push(seat);
        true
    }

    /// Confirm the selection
    ///
    /// # Errors
    ///
    /// See [`SeatMap::check_selection`].
    pub fn finalize(&self) -> Result<[Seat; SEATS_PER_BOOKING], SeatSelectionError> {
        self.map.check_selection(&self.seats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(label: &str) -> Seat {
        label.parse().unwrap_or(Seat::new(99, SeatColumn::A))
    }

    #[test]
    fn labels_parse_and_print() {
        assert_eq!(s("12C"), Seat::new(12, SeatColumn::C));
        assert_eq!(s("3e"), Seat::new(3, SeatColumn::E));
        assert_eq!(Seat::new(10, SeatColumn::F).to_string(), "10F");
        assert!("C12".parse::<Seat>().is_err());
        assert!("0A".parse::<Seat>().is_err());
        assert!("1G".parse::<Seat>().is_err());
        assert!("".parse::<Seat>().is_err());
    }

    #[test]
    fn seats_serialize_as_labels() {
        let json = serde_json::to_string(&vec![s("1A"), s("14F")]).unwrap_or_default();
        assert_eq!(json, r#"["1A","14F"]"#);
        let parsed: Vec<Seat> = serde_json::from_str(r#"["2C","2D"]"#).unwrap_or_default();
        assert_eq!(parsed, [s("2C"), s("2D")]);
    }

    #[test]
    fn standard_map_shape() {
        let map = SeatMap::standard();
        assert_eq!(map.seats().count(), 84);
        assert_eq!(map.seats().filter(|seat| map.is_occupied(*seat)).count(), 8);
        assert!(!map.contains(s("15A")));
    }

    #[test]
    fn toggle_limits_and_deselects() {
        let mut selection = SeatSelection::new(SeatMap::standard());
        assert!(!selection.toggle(s("1A")), "occupied seat must be ignored");
        assert!(selection.toggle(s("1B")));
        assert!(selection.toggle(s("1C")));
        assert!(!selection.toggle(s("1D")), "third seat must be ignored");
        assert_eq!(selection.seats(), [s("1B"), s("1C")]);

        assert!(selection.toggle(s("1B")));
        assert_eq!(selection.seats(), [s("1C")]);
        assert_eq!(selection.finalize(), Err(SeatSelectionError::WrongCount(1)));

        assert!(selection.toggle(s("1D")));
        assert_eq!(selection.finalize(), Ok([s("1C"), s("1D")]));
    }

    #[test]
    fn check_selection_rejects_bad_pairs() {
        let map = SeatMap::standard();
        assert_eq!(map.check_selection(&[s("5A"), s("5A")]), Err(SeatSelectionError::Duplicate(s("5A"))));
        assert_eq!(map.check_selection(&[s("5A"), s("7D")]), Err(SeatSelectionError::Occupied(s("7D"))));
        assert_eq!(map.check_selection(&[s("5A"), s("20B")]), Err(SeatSelectionError::OutsideMap(s("20B"))));
        assert_eq!(
            SeatSelectionError::WrongCount(3).to_string(),
            "Please select exactly 2 seats to continue"
        );
    }
}

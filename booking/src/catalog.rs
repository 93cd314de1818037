//! Static reference data: airports, routes and airlines.
//!
//! Everything here is immutable and compiled in. Routes are directional;
//! both directions of every city pair are listed.

use serde::Serialize;

/// An airport the search form offers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Airport {
    /// IATA code
    pub code: &'static str,
    /// City name
    pub city: &'static str,
    /// Airport name
    pub name: &'static str,
}

/// A directional route between two airports
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Route {
    /// Origin IATA code
    pub origin: &'static str,
    /// Destination IATA code
    pub destination: &'static str,
    /// Distance label shown to the user
    pub distance: &'static str,
    /// Shortest flight time in minutes (non-stop)
    pub min_duration: u32,
    /// Longest flight time in minutes (with stops)
    pub max_duration: u32,
    /// Base fare before synthesis adjustments
    pub base_price: u32,
}

/// An operating airline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Airline {
    /// Two-character airline designator
    pub code: &'static str,
    /// Display name
    pub name: &'static str,
    /// Logo asset reference
    pub logo: &'static str,
    /// Brand color (hex)
    pub primary_color: &'static str,
}

/// Airports served by the flow
pub const AIRPORTS: [Airport; 3] = [
    Airport {
        code: "DEL",
        city: "New Delhi",
        name: "Indira Gandhi International Airport",
    },
    Airport {
        code: "HYD",
        city: "Hyderabad",
        name: "Rajiv Gandhi International Airport",
    },
    Airport {
        code: "BOM",
        city: "Mumbai",
        name: "Chhatrapati Shivaji Maharaj International Airport",
    },
];

const fn route(
    origin: &'static str,
    destination: &'static str,
    distance: &'static str,
    min_duration: u32,
    max_duration: u32,
    base_price: u32,
) -> Route {
    Route {
        origin,
        destination,
        distance,
        min_duration,
        max_duration,
        base_price,
    }
}

/// The route table
pub const ROUTES: [Route; 6] = [
    route("DEL", "HYD", "1253 km", 110, 480, 7000),
    route("HYD", "DEL", "1253 km", 110, 480, 7000),
    route("DEL", "BOM", "1148 km", 90, 420, 6500),
    route("BOM", "DEL", "1148 km", 90, 420, 6500),
    route("HYD", "BOM", "631 km", 70, 360, 5500),
    route("BOM", "HYD", "631 km", 70, 360, 5500),
];

/// The airline catalog; every synthesized time slot is offered by each
pub const AIRLINES: [Airline; 4] = [
    Airline {
        code: "SG",
        name: "SpiceJet",
        logo: "/Spicejet.png",
        primary_color: "#ff5722",
    },
    Airline {
        code: "6E",
        name: "IndiGo",
        logo: "/Indigo.jpeg",
        primary_color: "#0a4894",
    },
    Airline {
        code: "QP",
        name: "Akasa Air",
        logo: "/Akasa Air.png",
        primary_color: "#ff6b6b",
    },
    Airline {
        code: "AI",
        name: "Air India",
        logo: "/Air India.jpeg",
        primary_color: "#e31837",
    },
];

/// Look up the route for an (origin, destination) pair
#[must_use]
pub fn find_route(origin: &str, destination: &str) -> Option<&'static Route> {
    ROUTES
        .iter()
        .find(|r| r.origin == origin && r.destination == destination)
}

/// Look up an airport by IATA code
#[must_use]
pub fn find_airport(code: &str) -> Option<&'static Airport> {
    AIRPORTS.iter().find(|a| a.code == code)
}

/// Look up an airline by display name
#[must_use]
pub fn find_airline_by_name(name: &str) -> Option<&'static Airline> {
    AIRLINES.iter().find(|a| a.name == name)
}

//! Skypass demo binary
//!
//! Walks one two-passenger session through every step against a live
//! store: search, enrollment, seats, check-in and boarding passes.

use anyhow::Context;
use chrono::NaiveDate;
use skypass_booking::error::Result;
use skypass_booking::{
    can_download, can_enter, qr_payload, search_flights, BookingAction, BookingConfig, BookingEnvironment,
    BookingError, BookingReducer, BookingState, BookingStore, FlightDetails, Passenger, PassengerSlot,
    SearchForm, Seat, SeatMap, SeatSelection, Step,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config = BookingConfig::from_env();
    config.validate().context("invalid SKYPASS_* configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Skypass: self-service flow ===\n");

    let env = BookingEnvironment::production(config);
    let tomorrow = env.local_now().date().succ_opt().context("date out of range")?;
    let store: BookingStore = BookingStore::new(BookingState::new(), BookingReducer::new(), env.clone());

    run_session(&store, &env, tomorrow).await?;

    store.shutdown_default().await?;
    println!("\n=== Session complete ===");
    Ok(())
}

async fn run_session(store: &BookingStore, env: &BookingEnvironment, date: NaiveDate) -> Result<()> {
    // Search
    let mut form = SearchForm::new("BOM", "DEL", date.to_string());
    form.swap();
    let offers = search_flights(&form, env)?;
    println!(">>> {} offers for {} -> {} on {}", offers.len(), form.origin, form.destination, form.date);
    for offer in offers.iter().take(5) {
        let tag = offer.special_offer.as_ref().map_or(String::new(), |s| format!(" [{}]", s.tag));
        println!(
            "    {:<10} {:<7} {} -> {}  {:<11} {:<8} INR {}{}",
            offer.airline,
            offer.flight_number,
            offer.departure_time.format("%H:%M"),
            offer.arrival_time.format("%H:%M"),
            offer.duration,
            offer.stops.to_string(),
            offer.price,
            tag
        );
    }
    let chosen = offers
        .first()
        .ok_or_else(|| BookingError::Session("No flights found for this route".to_string()))?;
    store.send(BookingAction::SetFlightDetails(FlightDetails::from_offer(chosen))).await?;

    // Enrollment
    for slot in PassengerSlot::ALL {
        let mut handle = store
            .send(BookingAction::CaptureFace {
                slot,
                data_url: format!("data:image/jpeg;base64,{slot}"),
            })
            .await?;
        handle.wait().await;
    }
    let mut passengers = store.state(|s| s.passengers.clone()).await;
    let names = [("Ravi", "Kumar", "ravi@example.com"), ("Asha", "Rao", "asha@example.com")];
    for (slot, (first, last, email)) in PassengerSlot::ALL.into_iter().zip(names) {
        let images = std::mem::take(&mut passengers.get_mut(slot).images);
        *passengers.get_mut(slot) = Passenger {
            images,
            ..Passenger::new(first, last, email)
        };
    }
    store.send(BookingAction::SubmitPassengerDetails(passengers)).await?;
    require_step(store, Step::SeatSelection).await?;

    // Seats
    let map = SeatMap::standard();
    let mut selection = SeatSelection::new(map);
    for seat in map.seats().filter(|seat| map.is_available(*seat)).take(2) {
        selection.toggle(seat);
    }
    let pair: [Seat; 2] = selection.finalize()?;
    println!("\n>>> Seats: {} and {}", pair[0], pair[1]);
    store.send(BookingAction::SubmitSeats(pair.to_vec())).await?;
    require_step(store, Step::SelfCheckIn).await?;

    // Check-in
    println!("\n>>> Verifying passengers...");
    let mut handles = Vec::new();
    for slot in PassengerSlot::ALL {
        handles.push(store.send(BookingAction::VerifyPassenger { slot }).await?);
    }
    for handle in &mut handles {
        handle.wait().await;
    }

    // Boarding passes
    store.send(BookingAction::GenerateBoardingPasses).await?;
    let state = store.snapshot().await;
    if let Some(message) = &state.last_error {
        return Err(BookingError::Session(message.clone()));
    }
    let Some(passes) = state.boarding_passes.as_ref() else {
        return Err(BookingError::Session("Error generating boarding passes".to_string()));
    };
    for pass in passes {
        println!(
            "\n    {} {}  seat {}  {} {} -> {}  boarding {}  PNR {}  SEQ {}",
            pass.passenger.first_name,
            pass.passenger.last_name,
            pass.passenger.seat,
            pass.flight.number,
            pass.flight.from,
            pass.flight.to,
            pass.flight.boarding_time.format("%H:%M"),
            pass.pnr,
            pass.seq
        );
        println!("    QR: {}", qr_payload(pass)?);
    }
    println!("\nDownload unlocked: {}", can_download(&state));
    Ok(())
}

async fn require_step(store: &BookingStore, step: Step) -> Result<()> {
    let state = store.snapshot().await;
    if let Some(message) = &state.last_error {
        return Err(BookingError::Session(message.clone()));
    }
    Ok(can_enter(step, &state)?)
}

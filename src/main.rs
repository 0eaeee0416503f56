use anyhow::{Context, bail};
use clap::Parser;

use medgrid::bootstrap_from_file;
use medgrid::geocoder::{Geocoder, MapboxGeocoder};

/// Searches for nearby resource nodes and optionally books one unit.
#[derive(Parser, Debug)]
#[command(name = "medgrid", about = "Capacity search and booking demo")]
struct Args {
    /// Node seed file (JSON).
    #[arg(long)]
    nodes: String,

    #[arg(long)]
    lat: Option<f64>,

    #[arg(long)]
    lng: Option<f64>,

    /// Street address to geocode instead of --lat/--lng. Needs
    /// MAPBOX_API_KEY in the environment.
    #[arg(long)]
    address: Option<String>,

    /// Search radius in km. Defaults to the engine-wide 500 km.
    #[arg(long)]
    radius: Option<f64>,

    /// Only show nodes with free units in this pool, e.g. "beds".
    #[arg(long)]
    pool: Option<String>,

    /// Book one unit of --pool (default "beds") at this node id.
    #[arg(long)]
    book: Option<String>,

    #[arg(long, default_value = "cli-user")]
    requester: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let service = bootstrap_from_file(&args.nodes)?;

    let (lat, lng) = match (&args.address, args.lat, args.lng) {
        (Some(address), _, _) => {
            let token = std::env::var("MAPBOX_API_KEY").context("--address needs MAPBOX_API_KEY set")?;
            let geocoder = MapboxGeocoder::new(token, None);
            let point = geocoder.geocode(address).await?;
            (point.lat, point.lng)
        }
        (None, Some(lat), Some(lng)) => (lat, lng),
        _ => bail!("either --address or both --lat and --lng are required"),
    };

    let response = service.search(lat, lng, args.radius, args.pool.as_deref())?;

    if response.degraded {
        log::warn!("Search degraded ({}). Showing an unfiltered node sample.", response.reason.as_deref().unwrap_or("unknown"));
    }

    for node in &response.nodes {
        match node.distance_km {
            Some(distance) => log::info!("{} ({}, {}) at {:.1} km, pools: {:?}", node.name, node.id, node.city, distance, node.pools),
            None => log::info!("{} ({}, {}), pools: {:?}", node.name, node.id, node.city, node.pools),
        }
    }

    if let Some(node_id) = &args.book {
        let pool = args.pool.as_deref().unwrap_or("beds");
        let booking = service.book(&args.requester, node_id, pool)?;
        log::info!("Booked reservation {} at {}. {} unit(s) remaining.", booking.reservation_id, node_id, booking.remaining);

        for reservation in service.list_reservations(&args.requester) {
            log::info!("Reservation {} on {}/{}: {} ({})", reservation.reservation_id, reservation.node_id, reservation.pool, reservation.state, reservation.created_at);
        }
    }

    Ok(())
}

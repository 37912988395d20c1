use anyhow::{bail, Context, Result};
#[cfg(feature = "routing")]
use plzmap::OsrmRouter;
use plzmap::{CancellationToken, RoutingService, SearchOutcome, SearchRequest, SelectionMode};
use tracing::warn;

use crate::cli::{Cli, SearchArgs};

fn parse_center(text: &str) -> Result<[f64; 2]> {
    let parts = text.split(',').map(|s| s.trim().parse::<f64>()).collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("[search] invalid --center {text:?}"))?;
    match parts.as_slice() {
        &[lon, lat] => Ok([lon, lat]),
        _ => bail!("[search] --center takes lon,lat"),
    }
}

pub fn run(cli: &Cli, args: &SearchArgs) -> Result<()> {
    let (mut session, store) = super::open_session(cli, &args.layer)?;

    let request = SearchRequest {
        center: parse_center(&args.center)?,
        radius: args.radius,
        metric: args.metric.into(),
        travel: args.travel.into(),
    };

    let routing_url = args.routing_url.clone().or_else(|| session.config().search.routing_url.clone());
    let router = match routing_url {
        Some(url) => make_router(&url, session.config().search.routing_timeout_secs)?,
        None => None,
    };

    let result = match session.search(&request, router.as_deref(), &CancellationToken::new()) {
        SearchOutcome::Completed(result) => result,
        SearchOutcome::Cancelled => bail!("[search] cancelled"),
    };
    if result.fell_back_to_approximation {
        warn!(error = ?result.error, "driving values are approximated");
        eprintln!("[search] values are estimates{}",
            result.error.as_deref().map(|e| format!(" ({e})")).unwrap_or_default());
    }

    for hit in &result.hits {
        match hit.duration_min {
            Some(minutes) => println!("{}\t{:.2} km\t{:.1} min", hit.code, hit.distance_km, minutes),
            None => println!("{}\t{:.2} km", hit.code, hit.distance_km),
        }
    }

    if args.select {
        session.select_hits(&result, SelectionMode::Add);
        super::finish(&mut session, store.as_ref(), &args.layer)?;
    }
    Ok(())
}

#[cfg(feature = "routing")]
fn make_router(url: &str, timeout_secs: u64) -> Result<Option<Box<dyn RoutingService>>> {
    Ok(Some(Box::new(OsrmRouter::new(url, timeout_secs)?)))
}

#[cfg(not(feature = "routing"))]
fn make_router(_url: &str, _timeout_secs: u64) -> Result<Option<Box<dyn RoutingService>>> {
    warn!("built without routing support; using the approximation model");
    Ok(None)
}

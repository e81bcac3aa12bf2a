//! Location stories

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};

use anet_model::Status;

use super::{mutate, ListQuery, StoryArgs, StoryOutcome, StoryRunnable};
use crate::error::StoryError;
use crate::gateway::SimContext;
use crate::lorem;
use crate::populate::{Frequency, Populate};
use crate::probability::GrowGate;
use crate::users::SimUser;

const CREATE_LOCATION: &str =
    "mutation ($location: LocationInput!) { createLocation(location: $location) { uuid } }";

const PLACES: &[&str] = &[
    "Village",
    "District",
    "Base",
    "Airfield",
    "Checkpoint",
    "Ministry",
    "Training Center",
    "Hospital",
];

/// Latitude and longitude bounds of generated locations
const LAT: (f64, f64) = (29.4, 38.5);
const LNG: (f64, f64) = (60.5, 74.9);

/// Random location fields; coordinates are rounded to six decimals
pub fn random_location<R: Rng + ?Sized>(status: Status, rng: &mut R) -> Map<String, Value> {
    let mut location = Map::new();
    location.insert("status".into(), json!(status));
    Populate::new(&mut location, rng)
        .field(Frequency::Always, |l, rng| {
            let base = lorem::SURNAMES.choose(rng).copied().unwrap_or("Kabul");
            let place = PLACES.choose(rng).copied().unwrap_or("Village");
            l.insert("name".into(), json!(format!("{base} {place}")));
        })
        .field(Frequency::Often, |l, rng| {
            let round = |v: f64| (v * 1e6).round() / 1e6;
            l.insert("lat".into(), json!(round(rng.gen_range(LAT.0..LAT.1))));
            l.insert("lng".into(), json!(round(rng.gen_range(LNG.0..LNG.1))));
        });
    location
}

/// Create a location, while the population is below its target
///
/// Arguments: `status`, active by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateLocation;

#[async_trait]
impl StoryRunnable for CreateLocation {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        gate: &GrowGate,
        args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let cred = user.credential();
        let count = ListQuery::LOCATIONS.count(ctx, &cred, &json!({})).await?;
        if !gate.grow(count) {
            return Ok(StoryOutcome::Skipped(format!("{count} locations exist")));
        }
        let status = args.get::<Status>("status").unwrap_or(Status::Active);
        let location = random_location(status, &mut StdRng::from_entropy());
        tracing::debug!(name = ?location.get("name"), "creating location");
        mutate(ctx, &cred, CREATE_LOCATION, "createLocation", json!({ "location": location })).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let location = random_location(Status::Active, &mut rng);
            assert!(location["name"].as_str().is_some_and(|n| n.contains(' ')));
            if let Some(lat) = location.get("lat").and_then(Value::as_f64) {
                assert!((LAT.0..=LAT.1).contains(&lat));
                let lng = location["lng"].as_f64().unwrap();
                assert!((LNG.0..=LNG.1).contains(&lng));
            }
        }
    }
}

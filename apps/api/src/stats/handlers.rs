use std::str::FromStr;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::person::{Sector, UnknownVariant};
use crate::people::search::empty_as_none;
use crate::state::AppState;
use crate::stats::ranking::{rank_counts, RankedCount};
use crate::store::{GroupField, PlacedPerson, PlacementScope};

/// Sector selector of the statistics view. `TODOS` selects every sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorFilter {
    All,
    Only(Sector),
}

impl FromStr for SectorFilter {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("TODOS") {
            Ok(SectorFilter::All)
        } else {
            s.parse().map(SectorFilter::Only)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlacementParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sector: Option<SectorFilter>,
}

impl PlacementParams {
    fn scope(&self) -> PlacementScope {
        match self.sector {
            Some(SectorFilter::Only(sector)) => PlacementScope {
                sector: Some(sector),
            },
            Some(SectorFilter::All) | None => PlacementScope::default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlacementStats {
    pub total: usize,
    /// Placed records, most recently created first.
    pub people: Vec<PlacedPerson>,
    pub companies: Vec<RankedCount>,
}

/// GET /api/v1/stats/placements
pub async fn handle_placements(
    State(state): State<AppState>,
    params: Result<Query<PlacementParams>, QueryRejection>,
) -> Result<Json<PlacementStats>, AppError> {
    let Query(params) = params.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let scope = params.scope();

    let (people, company_rows) = tokio::try_join!(
        state.people.list_placed(&scope),
        state.people.count_placed_by(GroupField::Company, &scope),
    )
    .map_err(AppError::retrieval)?;

    info!(
        sector = ?scope.sector,
        total = people.len(),
        "Placement statistics computed"
    );

    Ok(Json(PlacementStats {
        total: people.len(),
        people,
        companies: rank_counts(company_rows),
    }))
}

/// GET /api/v1/stats/placements/sectors
pub async fn handle_sector_ranking(
    State(state): State<AppState>,
) -> Result<Json<Vec<RankedCount>>, AppError> {
    let rows = state
        .people
        .count_placed_by(GroupField::Sector, &PlacementScope::default())
        .await
        .map_err(AppError::retrieval)?;
    Ok(Json(rank_counts(rows)))
}

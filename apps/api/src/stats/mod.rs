// Placement statistics: who was placed, grouped by sector and company.

pub mod handlers;
pub mod ranking;

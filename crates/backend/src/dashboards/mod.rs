pub mod d400_farm_analytics;

pub mod trip_api;

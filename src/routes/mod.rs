pub mod time_routes;

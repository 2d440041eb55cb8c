#[path = "property/resolver_order.rs"]
mod resolver_order;

#[path = "property/sequence_round_trip.rs"]
mod sequence_round_trip;

#[path = "property/reachability.rs"]
mod reachability;

#[path = "e2e/directory_layout.rs"]
mod directory_layout;

#[path = "e2e/action_sequences.rs"]
mod action_sequences;

#[path = "e2e/search_chains.rs"]
mod search_chains;

#[path = "e2e/fatal_paths.rs"]
mod fatal_paths;

#[path = "e2e/determinism.rs"]
mod determinism;

//! List the NPA endpoints known to the Rust client.
//!
//! Run:
//! `cargo run --example blocking_list_operations`

use netro_client::{BlockingNetroClient, DEFAULT_BASE_URL};

fn main() {
    println!("Default NPA endpoint: {DEFAULT_BASE_URL}");

    let operations = BlockingNetroClient::operations();
    println!("Loaded {} operations", operations.len());

    for operation in operations {
        println!(
            "- {:<4} {:<16} {}",
            operation.method, operation.name, operation.summary
        );
    }
}

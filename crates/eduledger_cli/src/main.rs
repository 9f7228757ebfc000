//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `eduledger_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use eduledger_core::{MemoryLedger, RecordContract};

fn main() {
    println!("eduledger_core version={}", eduledger_core::core_version());

    let contract = RecordContract::new(MemoryLedger::new());
    if let Err(err) = contract.invoke("InitLedger", &[]) {
        eprintln!("seed failed: {err}");
        std::process::exit(1);
    }

    match contract.invoke("GetAllEvaluations", &[]) {
        Ok(body) => println!("seeded evaluations={}", String::from_utf8_lossy(&body)),
        Err(err) => {
            eprintln!("read-back failed: {err}");
            std::process::exit(1);
        }
    }
}

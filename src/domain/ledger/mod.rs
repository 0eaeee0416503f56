pub mod capacity_ledger;

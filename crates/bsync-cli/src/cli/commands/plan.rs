//! `bsync plan` – show the initial allocation for a block count.

use bsync_core::reservations::{plan_allocation, AllocationPlan};

pub(crate) fn format_plan(plan: &AllocationPlan) -> String {
    format!(
        "  {:>8}  {:>10}  {:>10}  {:>10}  {:>10}\n  {:>8}  {:>10}  {:>10}  {:>10}  {:>10}",
        "Rows", "Pending", "Per row", "Reserved", "Retained",
        plan.rows,
        plan.pending,
        plan.per_row(),
        plan.distributed(),
        plan.retained()
    )
}

pub fn run_plan(blocks: usize, connections: usize) {
    let plan = plan_allocation(connections, blocks);
    println!("{}", format_plan(&plan));
    if plan.rows == 0 {
        println!("No rows: nothing to reserve.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_plan_shows_retained() {
        let out = format_plan(&plan_allocation(4, 10));
        let values: Vec<&str> = out.lines().nth(1).unwrap().split_whitespace().collect();
        assert_eq!(values, vec!["4", "10", "2", "8", "2"]);
    }
}

//! Renders a [`fl_metrics::MetricReport`] as the CLI's stdout summary.
//! Leaderboard printing and CSV/plot rendering live outside this harness's
//! core, this is just the minimal summary the CLI itself owns.

use fl_metrics::MetricReport;

pub fn print_summary(report: &MetricReport) {
    println!("faultline run summary ({} task(s))", report.total_tasks);
    println!("  WCR  (completion rate)        {:.3}", report.wcr);
    println!("  HIR  (escalation rate)        {:.3}", report.hir);
    println!("  RR_task (task recovery rate)  {:.3}", report.rr_task);
    println!("  RR_event (event recovery rate) {:.3}", report.rr_event);
    println!("  MTTR_event                    {:.1} ms", report.mttr_event_ms);
    println!("  CPT  (calls per task)         {:.2}", report.cpt);
    println!("  CPS  (calls per success)      {:.2}", report.cps);
    println!("  RCO  (recovery cost overhead) {:.3}", report.rco);
    println!("  UAR  (auth/policy task rate)  {:.3}", report.uar);
    println!("  SRR  (safe-rollback rate)     {:.3}", report.srr);
    println!("  diagnosis calls               {}", report.llm_calls);

    if !report.by_first_error_kind_task.is_empty() {
        println!("  first error kind, by task:");
        for (kind, count) in &report.by_first_error_kind_task {
            println!("    {kind:<16} {count}");
        }
    }
    if !report.by_error_kind_event.is_empty() {
        println!("  error kind, by event:");
        for (kind, count) in &report.by_error_kind_event {
            println!("    {kind:<16} {count}");
        }
    }
}

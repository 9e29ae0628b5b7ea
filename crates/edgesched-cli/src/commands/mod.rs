pub mod run;
pub mod validate;

use edgesched_scheduler::StrategyRegistry;

pub fn algorithms() -> anyhow::Result<()> {
    for name in StrategyRegistry::with_defaults().names() {
        println!("{name}");
    }
    Ok(())
}

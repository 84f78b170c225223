/// Orchestrator-level tuning, independent of any one profile (spec.md
/// §4.5/§5). Profile-level chunking/batching/distance knobs live on
/// `common::config::profile::Profile` instead.
#[derive(Debug, Clone)]
pub struct IngestionTuning {
    pub logs_tail_lines: usize,
}

impl Default for IngestionTuning {
    fn default() -> Self {
        Self {
            logs_tail_lines: 50,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestionConfig {
    pub tuning: IngestionTuning,
}

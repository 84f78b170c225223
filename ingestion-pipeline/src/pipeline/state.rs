use state_machines::state_machine;

// Milestone-level typestate for one job run. The ten steps named in
// spec.md §4.5 are tracked as fine-grained counters on `Job.progress`
// rather than as distinct states here — this machine exists to make
// illegal orderings (e.g. rotating an alias before anything was upserted)
// a compile error, not to mirror every step 1:1.
state_machine! {
    name: IngestionMachine,
    state: IngestionState,
    initial: Ready,
    states: [Ready, ManifestExpanded, Upserted, Evaluated, Finalized, Failed],
    events {
        expand_manifest { transition: { from: Ready, to: ManifestExpanded } }
        process_and_upsert { transition: { from: ManifestExpanded, to: Upserted } }
        evaluate { transition: { from: Upserted, to: Evaluated } }
        finalize { transition: { from: Evaluated, to: Finalized } }
        abort {
            transition: { from: Ready, to: Failed }
            transition: { from: ManifestExpanded, to: Failed }
            transition: { from: Upserted, to: Failed }
            transition: { from: Evaluated, to: Failed }
            transition: { from: Finalized, to: Failed }
        }
    }
}

pub fn ready() -> IngestionMachine<(), Ready> {
    IngestionMachine::new(())
}

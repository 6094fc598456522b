/// Execute an aggregate command deterministically (no IO, no async).
///
/// 1. **Decide**: `aggregate.handle(command)` returns events without mutating.
/// 2. **Evolve**: each event is applied in order via `aggregate.apply(event)`.
///
/// Because decision happens before any mutation, a rejected command leaves
/// the aggregate exactly as it was. Callers observe all of a command's state
/// changes at once.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: finansiki_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}

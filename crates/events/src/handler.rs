/// Execute an aggregate command inline: decide, then evolve.
///
/// 1. `aggregate.handle(command)` produces events without mutating.
/// 2. Each event is applied in order.
///
/// Nothing is applied when `handle` fails, so a rejected command leaves the
/// aggregate untouched. Returns the applied events.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: ecopricing_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecopricing_core::{Aggregate, AggregateRoot};

    #[derive(Debug, Clone)]
    struct Counter {
        id: u8,
        value: i64,
        version: u64,
    }

    impl AggregateRoot for Counter {
        type Id = u8;

        fn id(&self) -> &u8 {
            &self.id
        }

        fn version(&self) -> u64 {
            self.version
        }
    }

    impl Aggregate for Counter {
        type Command = i64;
        type Event = i64;
        type Error = &'static str;

        fn apply(&mut self, event: &i64) {
            self.value += event;
            self.version += 1;
        }

        fn handle(&self, command: &i64) -> Result<Vec<i64>, &'static str> {
            if *command == 0 {
                return Err("zero delta");
            }
            Ok(vec![*command])
        }
    }

    #[test]
    fn execute_applies_emitted_events() {
        let mut c = Counter { id: 1, value: 0, version: 0 };
        let events = execute(&mut c, &5).unwrap();
        assert_eq!(events, vec![5]);
        assert_eq!(c.value, 5);
        assert_eq!(c.version(), 1);
    }

    #[test]
    fn rejected_command_leaves_state_untouched() {
        let mut c = Counter { id: 1, value: 7, version: 3 };
        assert_eq!(execute(&mut c, &0), Err("zero delta"));
        assert_eq!(c.value, 7);
        assert_eq!(c.version(), 3);
    }
}

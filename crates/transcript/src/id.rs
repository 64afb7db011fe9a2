/// Source of opaque clip identities.
pub trait IdGenerator: Send + Sync {
    fn next_id(&mut self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGen;

impl IdGenerator for UuidIdGen {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic generator for tests and snapshots: `clip-0`, `clip-1`, ...
#[derive(Debug, Default, Clone)]
pub struct SequentialIdGen {
    next: u64,
}

impl SequentialIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }
}

impl IdGenerator for SequentialIdGen {
    fn next_id(&mut self) -> String {
        let id = self.next;
        self.next += 1;
        format!("clip-{id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_are_stable() {
        let mut ids = SequentialIdGen::new();
        assert_eq!(ids.next_id(), "clip-0");
        assert_eq!(ids.next_id(), "clip-1");
    }

    #[test]
    fn uuid_ids_are_unique() {
        let mut ids = UuidIdGen;
        assert_ne!(ids.next_id(), ids.next_id());
    }
}

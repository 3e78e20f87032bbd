use crate::domain::rider::Rider;

/// Picks one rider from the currently available pool.
///
/// Implementations must be deterministic given a fixed input order, so that
/// assignment stays testable. The pool only contains `available` riders; the
/// caller handles losing the subsequent compare-and-set race.
pub trait RiderSelector: Send + Sync {
    fn select<'a>(&self, pool: &'a [Rider]) -> Option<&'a Rider>;
    fn name(&self) -> &'static str;
}

/// The platform's selection policy: the first available rider in iteration
/// order, with no distance or load ranking.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstAvailable;

impl RiderSelector for FirstAvailable {
    fn select<'a>(&self, pool: &'a [Rider]) -> Option<&'a Rider> {
        pool.first()
    }

    fn name(&self) -> &'static str {
        "first-available"
    }
}

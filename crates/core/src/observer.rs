/// Receives events from a running simulation.
///
/// An observer may return an action to steer the run, for example to stop it
/// once a tank runs dry. Returning `None` lets the run continue.
///
/// Implemented for `()` (ignores every event) and for any
/// `FnMut(&Event) -> Option<Action>` closure.
pub trait Observer<Event, Action> {
    /// Observes a single event.
    fn observe(&mut self, event: &Event) -> Option<Action>;
}

impl<Event, Action> Observer<Event, Action> for () {
    fn observe(&mut self, _event: &Event) -> Option<Action> {
        None
    }
}

impl<Event, Action, F> Observer<Event, Action> for F
where
    F: FnMut(&Event) -> Option<Action>,
{
    fn observe(&mut self, event: &Event) -> Option<Action> {
        self(event)
    }
}

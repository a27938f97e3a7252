/// A translation target.
///
/// The backend value itself carries any per-translation state a target
/// needs (table aliases, counters); rules reach it through
/// [`Translator::backend_mut`](crate::Translator::backend_mut).
pub trait Backend: 'static {
    /// Name used in dispatch and capability errors.
    const NAME: &'static str;

    /// What a single rule produces.
    type Output: Clone;
}

//! Memo records attached to memoized nodes.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use super::value::DynValue;
use super::view::View;

/// Custom parameter equality for a memo boundary.
pub(crate) type ParamsEq = Rc<dyn Fn(&dyn Any, &dyn Any) -> bool>;

/// Adapt a typed comparison into a [`ParamsEq`]. Parameters of any other
/// type never compare equal.
pub(crate) fn params_eq<P: 'static>(eq: impl Fn(&P, &P) -> bool + 'static) -> ParamsEq {
    Rc::new(move |a: &dyn Any, b: &dyn Any| match (a.downcast_ref::<P>(), b.downcast_ref::<P>()) {
        (Some(a), Some(b)) => eq(a, b),
        _ => false,
    })
}

/// Last `(params, output)` pair of a memoized node.
///
/// Written only when the node itself recomputes, on either invalidation
/// path; a skip leaves it untouched.
pub(crate) struct MemoRecord {
    last: Option<(Box<dyn DynValue>, View)>,
    eq: Option<ParamsEq>,
}

impl MemoRecord {
    pub(crate) fn new(eq: Option<ParamsEq>) -> Self {
        Self { last: None, eq }
    }

    pub(crate) fn set_eq(&mut self, eq: Option<ParamsEq>) {
        self.eq = eq;
    }

    /// Whether `params` equal the parameters of the last recomputation.
    /// Always false before the first recomputation.
    pub(crate) fn matches(&self, params: &dyn DynValue) -> bool {
        let Some((last, _)) = &self.last else {
            return false;
        };
        match &self.eq {
            Some(eq) => eq(last.as_any(), params.as_any()),
            None => last.eq_dyn(params),
        }
    }

    pub(crate) fn store(&mut self, params: Box<dyn DynValue>, output: View) {
        self.last = Some((params, output));
    }

    pub(crate) fn last_output(&self) -> Option<&View> {
        self.last.as_ref().map(|(_, output)| output)
    }
}

impl fmt::Debug for MemoRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoRecord")
            .field("last_params", &self.last.as_ref().map(|(params, _)| params))
            .field("custom_eq", &self.eq.is_some())
            .finish()
    }
}

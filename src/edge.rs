use std::fmt::{Debug, Formatter};

use crate::header_space::HeaderSpace;
use crate::state::State;
use crate::transition::Transition;

/// A directed transition between two graph states.
pub struct Edge<D: HeaderSpace> {
    pre_state: State,
    post_state: State,
    transition: Transition<D>,
}

impl<D: HeaderSpace> Edge<D> {
    pub fn new(pre_state: State, post_state: State, transition: Transition<D>) -> Self {
        Self {
            pre_state,
            post_state,
            transition,
        }
    }

    /// An edge that every header traverses unchanged.
    pub fn identity(pre_state: State, post_state: State) -> Self {
        Self::new(pre_state, post_state, Transition::Identity)
    }

    /// An edge that only headers in `set` traverse.
    pub fn constraint(pre_state: State, post_state: State, set: D::Set) -> Self {
        Self::new(pre_state, post_state, Transition::Constraint(set))
    }

    pub fn pre_state(&self) -> &State {
        &self.pre_state
    }

    pub fn post_state(&self) -> &State {
        &self.post_state
    }

    pub fn transition(&self) -> &Transition<D> {
        &self.transition
    }

    pub(crate) fn into_parts(self) -> (State, State, Transition<D>) {
        (self.pre_state, self.post_state, self.transition)
    }

    /// Headers reachable at the post-state from headers `h` at the pre-state.
    pub fn traverse_forward(&self, domain: &D, h: &D::Set) -> D::Set {
        self.transition.traverse_forward(domain, h)
    }

    /// Headers at the pre-state that can reach `h` at the post-state.
    pub fn traverse_backward(&self, domain: &D, h: &D::Set) -> D::Set {
        self.transition.traverse_backward(domain, h)
    }
}

impl<D: HeaderSpace> Clone for Edge<D> {
    fn clone(&self) -> Self {
        Self {
            pre_state: self.pre_state.clone(),
            post_state: self.post_state.clone(),
            transition: self.transition.clone(),
        }
    }
}

impl<D: HeaderSpace> Debug for Edge<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Edge")
            .field("pre_state", &self.pre_state)
            .field("post_state", &self.post_state)
            .field("transition", &self.transition)
            .finish()
    }
}

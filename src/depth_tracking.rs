use crate::{
    element::Element,
    error::{Error, Result},
    MAX_DEPTH,
};

/// Tracks how deeply nested the elements of a document are, as they are written or read.
#[derive(Clone, Debug)]
pub struct DepthTracker {
    tracking: Vec<usize>,
    max_depth: usize,
}

impl Default for DepthTracker {
    fn default() -> Self {
        Self::new(MAX_DEPTH)
    }
}

impl DepthTracker {
    /// Create a new depth tracker that fails once nesting goes past `max_depth`.
    pub fn new(max_depth: usize) -> Self {
        Self {
            tracking: Vec::new(),
            max_depth,
        }
    }

    /// Update the depth tracker on each new element.
    pub fn update_elem(&mut self, elem: &Element) -> Result<()> {
        // Subtract from count for next element
        if let Some(v) = self.tracking.last_mut() {
            *v -= 1;
        }

        // Increase nest depth if this is a nesting element
        match elem {
            Element::Map(len) => self.tracking.push(2 * *len), // 2 elements per map item
            Element::Array(len) => self.tracking.push(*len),
            _ => (),
        }

        // Check to see if we hit the nesting limit
        if self.tracking.len() > self.max_depth {
            return Err(Error::ParseLimit("Depth limit exceeded".to_string()));
        }

        self.purge_zeros();
        Ok(())
    }

    /// Drop any depth tracking elements that have hit zero
    fn purge_zeros(&mut self) {
        while let Some(0) = self.tracking.last() {
            self.tracking.pop();
        }
    }
}

use indexmap::IndexMap;

use super::surface::{ListenerId, MapEventKind, MapSurface};

/// What the controller does when a bound listener fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    // NORMAL
    OpenContextMenu,
    LongPressStart,
    LongPressMove,
    LongPressEnd,
    SegmentHoverEnter,
    SegmentHoverLeave,
    NodeHoverEnter,
    NodeHoverLeave,
    NodeDragStart,
    NodeDragMove,
    NodeDragEnd,
    // EDIT
    DrawClick,
    SnapEnter,
    SnapMove,
    SnapLeave,
    // AUTO_SEGMENT
    RouteNodeClick,
    RouteHoverEnter,
    RouteHoverLeave,
    EscapeKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub kind: MapEventKind,
    pub layer: Option<String>,
    pub handler: Handler,
}

/// Every listener the controller has installed on the surface.
///
/// The only way to remove a listener is [`BindingRegistry::clear`], which
/// removes all of them.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    installed: IndexMap<ListenerId, Binding>,
}

impl BindingRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install<S: MapSurface>(
        &mut self,
        surface: &mut S,
        kind: MapEventKind,
        layer: Option<&str>,
        handler: Handler,
    ) -> ListenerId {
        let id = surface.on(kind, layer);
        self.installed.insert(
            id,
            Binding {
                kind,
                layer: layer.map(str::to_string),
                handler,
            },
        );
        id
    }

    /// Remove every installed listener from the surface. Returns how many
    /// were removed.
    pub fn clear<S: MapSurface>(&mut self, surface: &mut S) -> usize {
        let removed = self.installed.len();
        for (id, _) in self.installed.drain(..) {
            surface.off(id);
        }
        removed
    }

    #[must_use]
    pub fn handler_for(&self, id: ListenerId) -> Option<Handler> {
        self.installed.get(&id).map(|binding| binding.handler)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.installed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ListenerId, &Binding)> {
        self.installed.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::test_support::RecordingSurface;

    #[test]
    fn test_install_registers_on_surface() {
        let mut surface = RecordingSurface::new();
        let mut registry = BindingRegistry::new();

        let id = registry.install(&mut surface, MapEventKind::Click, None, Handler::DrawClick);
        registry.install(&mut surface, MapEventKind::MouseEnter, Some("nodes-crossroad"), Handler::SnapEnter);

        assert_eq!(registry.len(), 2);
        assert_eq!(surface.listener_count(), 2);
        assert_eq!(registry.handler_for(id), Some(Handler::DrawClick));
    }

    #[test]
    fn test_clear_removes_everything() {
        let mut surface = RecordingSurface::new();
        let mut registry = BindingRegistry::new();
        let id = registry.install(&mut surface, MapEventKind::Click, None, Handler::DrawClick);
        registry.install(&mut surface, MapEventKind::KeyDown, None, Handler::EscapeKey);

        assert_eq!(registry.clear(&mut surface), 2);
        assert!(registry.is_empty());
        assert_eq!(surface.listener_count(), 0);
        assert_eq!(registry.handler_for(id), None);
    }

    #[test]
    fn test_clear_on_empty_registry_is_noop() {
        let mut surface = RecordingSurface::new();
        let mut registry = BindingRegistry::new();
        assert_eq!(registry.clear(&mut surface), 0);
    }
}

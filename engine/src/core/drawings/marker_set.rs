//! Marker Set
//!
//! Composite drawing owning every numbered marker of a session. The host talks
//! to the set as if it were one drawing; the set routes pointer manipulation to
//! its selected marker and iterates all markers for drawing and hit testing.
//!
//! # Numbering
//!
//! Markers are kept sorted by value. A new marker takes the smallest value
//! missing from `1..=N` (a hole left by a deletion), or `max + 1` when the
//! sequence is contiguous. The linear scan is fine for the tens to low
//! hundreds of markers a session holds.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{
    drawings::{
        CoordinateTransform, Drawable, DrawingCapabilities, FadeDescriptor, HitResult,
        MarkerRecord, MarkerStyle, ModifierKeys, MultiDrawing, NumberedMarker, RenderSurface,
    },
    CoreError, CoreResult, Point2D, Timestamp,
};

/// Label shown for the tool in UI chrome
pub const DISPLAY_NAME: &str = "Numbered markers";

// =============================================================================
// Persisted Fragment
// =============================================================================

/// One element of the persisted fragment; the variant name is the wrapper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FragmentElement {
    NumberedMarker(MarkerRecord),
}

// =============================================================================
// Allocation
// =============================================================================

/// Value expected at the first gap in an ascending `1..=N` numbering.
fn first_hole(markers: &[NumberedMarker]) -> Option<u32> {
    markers
        .iter()
        .enumerate()
        .find(|(index, marker)| marker.value() as usize > index + 1)
        .map(|(index, _)| (index + 1) as u32)
}

fn next_value(markers: &[NumberedMarker]) -> u32 {
    match markers.last() {
        None => 1,
        Some(last) => first_hole(markers).unwrap_or(last.value() + 1),
    }
}

/// Inserts before the first marker with a greater value. Returns the index.
fn insert_sorted(markers: &mut Vec<NumberedMarker>, marker: NumberedMarker) -> usize {
    let index = markers
        .iter()
        .position(|existing| existing.value() > marker.value())
        .unwrap_or(markers.len());
    markers.insert(index, marker);
    index
}

// =============================================================================
// Marker Set
// =============================================================================

/// Ordered collection of numbered markers with a single selection.
#[derive(Clone, Debug)]
pub struct MarkerSet {
    /// Sorted strictly ascending by value
    markers: Vec<NumberedMarker>,
    /// Always a valid index into `markers` when present
    selected: Option<usize>,
    /// Style applied to newly placed markers
    style: MarkerStyle,
    /// Fade behavior applied to newly placed markers
    fade_profile: FadeDescriptor,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self::new(MarkerStyle::default(), FadeDescriptor::new(0, 1))
    }
}

impl MarkerSet {
    pub fn new(style: MarkerStyle, fade_profile: FadeDescriptor) -> Self {
        Self {
            markers: Vec::new(),
            selected: None,
            style,
            fade_profile,
        }
    }

    /// Style used for markers placed from now on
    pub fn set_style(&mut self, style: MarkerStyle) {
        self.style = style;
    }

    pub fn set_fade_profile(&mut self, fade_profile: FadeDescriptor) {
        self.fade_profile = fade_profile;
    }

    pub fn count(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NumberedMarker> {
        self.markers.iter()
    }

    /// Values in collection order
    pub fn values(&self) -> Vec<u32> {
        self.markers.iter().map(NumberedMarker::value).collect()
    }

    pub fn contains_value(&self, value: u32) -> bool {
        self.markers.iter().any(|m| m.value() == value)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Copy of the selected marker
    pub fn selected_member(&self) -> Option<NumberedMarker> {
        self.selected
            .and_then(|index| self.markers.get(index))
            .cloned()
    }

    fn selected_mut(&mut self) -> Option<&mut NumberedMarker> {
        match self.selected {
            Some(index) => self.markers.get_mut(index),
            None => None,
        }
    }

    pub fn capabilities(&self) -> DrawingCapabilities {
        DrawingCapabilities::NONE
    }

    /// Value the next placed marker would receive
    pub fn next_value(&self) -> u32 {
        next_value(&self.markers)
    }

    /// Places a new marker and selects it. Returns its value.
    pub fn add_new(
        &mut self,
        point: Point2D,
        current_time: Timestamp,
        frame_interval: Timestamp,
    ) -> u32 {
        let value = next_value(&self.markers);
        let marker = NumberedMarker::new(value, point, current_time, frame_interval)
            .with_style(self.style.clone())
            .with_fade_profile(&self.fade_profile);

        let index = insert_sorted(&mut self.markers, marker);
        self.selected = Some(index);

        debug!(value, index, "Placed numbered marker");
        value
    }

    /// Re-inserts a recorded marker (redo/undo replay) and selects it.
    ///
    /// Allocation is bypassed. Markers whose value is zero or already taken
    /// are dropped so the set never holds duplicates.
    pub fn add_existing(&mut self, marker: NumberedMarker) {
        let value = marker.value();
        if value == 0 {
            warn!("Ignoring replayed marker with value 0");
            return;
        }
        if self.contains_value(value) {
            warn!(value, "Ignoring replayed marker with a value already in use");
            return;
        }

        let index = insert_sorted(&mut self.markers, marker);
        self.selected = Some(index);
        debug!(value, index, "Restored numbered marker");
    }

    /// Removes `marker` (matched by identity) and clears the selection.
    ///
    /// No neighbouring marker is reselected.
    pub fn remove(&mut self, marker: &NumberedMarker) -> bool {
        let position = self.markers.iter().position(|m| m.id() == marker.id());
        if let Some(index) = position {
            self.markers.remove(index);
            debug!(value = marker.value(), "Removed numbered marker");
        }
        self.selected = None;
        position.is_some()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
        self.selected = None;
    }

    /// Persisted form of every marker, in value order
    pub fn write_fragment(&self) -> Vec<FragmentElement> {
        self.markers
            .iter()
            .map(|m| FragmentElement::NumberedMarker(m.to_record()))
            .collect()
    }

    /// Restores markers from a persisted fragment.
    ///
    /// Invalid records and duplicate values are skipped. The selection is
    /// cleared afterwards. Returns the number of markers restored.
    pub fn read_fragment(&mut self, elements: &[FragmentElement]) -> usize {
        let mut restored = 0;
        for element in elements {
            let FragmentElement::NumberedMarker(record) = element;
            if let Err(e) = record.validate() {
                warn!("Skipping invalid marker record: {}", e);
                continue;
            }
            if self.contains_value(record.value) {
                warn!(value = record.value, "Skipping duplicate marker record");
                continue;
            }

            let marker = NumberedMarker::from_record(record)
                .with_style(self.style.clone())
                .with_fade_profile(&self.fade_profile);
            insert_sorted(&mut self.markers, marker);
            restored += 1;
        }
        self.selected = None;
        restored
    }
}

impl fmt::Display for MarkerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(DISPLAY_NAME)
    }
}

impl Drawable for MarkerSet {
    fn fading(&self) -> CoreResult<&FadeDescriptor> {
        Err(CoreError::NotSupported(
            "Fading of numbered markers is not configurable".to_string(),
        ))
    }

    fn set_fading(&mut self, _fading: FadeDescriptor) -> CoreResult<()> {
        Err(CoreError::NotSupported(
            "Fading of numbered markers is not configurable".to_string(),
        ))
    }

    fn capabilities(&self) -> DrawingCapabilities {
        DrawingCapabilities::NONE
    }

    fn draw(
        &self,
        surface: &mut dyn RenderSurface,
        transform: &CoordinateTransform,
        _selected: bool,
        current_time: Timestamp,
    ) {
        // Set-level draw never outlines members.
        for marker in &self.markers {
            marker.draw(surface, transform, false, current_time);
        }
    }

    fn hit_test(&mut self, point: Point2D, current_time: Timestamp) -> HitResult {
        for (index, marker) in self.markers.iter_mut().enumerate() {
            let result = marker.hit_test(point, current_time);
            if result.is_hit() {
                self.selected = Some(index);
                return result;
            }
        }
        HitResult::Miss
    }

    fn move_handle(&mut self, point: Point2D, handle: u32) {
        if let Some(marker) = self.selected_mut() {
            marker.move_handle(point, handle);
        }
    }

    fn move_drawing(&mut self, dx: f64, dy: f64, modifiers: ModifierKeys) {
        if let Some(marker) = self.selected_mut() {
            marker.move_drawing(dx, dy, modifiers);
        }
    }

    fn display_name(&self) -> String {
        DISPLAY_NAME.to_string()
    }
}

impl MultiDrawing for MarkerSet {
    fn count(&self) -> usize {
        self.markers.len()
    }

    fn selected_item(&self) -> Option<Box<dyn Any>> {
        self.selected_member()
            .map(|marker| Box::new(marker) as Box<dyn Any>)
    }

    fn add_item(&mut self, item: Box<dyn Any>) {
        match item.downcast::<NumberedMarker>() {
            Ok(marker) => self.add_existing(*marker),
            Err(_) => debug!("Ignoring non-marker payload on add"),
        }
    }

    fn remove_item(&mut self, item: &dyn Any) {
        match item.downcast_ref::<NumberedMarker>() {
            Some(marker) => {
                self.remove(marker);
            }
            None => debug!("Ignoring non-marker payload on remove"),
        }
    }

    fn clear(&mut self) {
        self.markers.clear();
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::drawings::{numbered_marker::LABEL_HANDLE, DisplayList, Primitive};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const T: Timestamp = 1000;
    const INTERVAL: Timestamp = 40;

    fn set_with_values(values: &[u32]) -> MarkerSet {
        let mut set = MarkerSet::default();
        for (i, value) in values.iter().enumerate() {
            set.add_existing(NumberedMarker::new(
                *value,
                Point2D::new(100.0 * (i as f64 + 1.0), 100.0),
                T,
                INTERVAL,
            ));
        }
        set
    }

    fn assert_invariants(set: &MarkerSet) {
        let values = set.values();
        assert!(
            values.windows(2).all(|w| w[0] < w[1]),
            "values not strictly ascending: {:?}",
            values
        );
        if let Some(index) = set.selected_index() {
            assert!(index < set.count());
        }
    }

    fn smallest_missing(values: &[u32]) -> u32 {
        (1..).find(|v| !values.contains(v)).unwrap()
    }

    #[test]
    fn test_empty_set_allocates_one() {
        let mut set = MarkerSet::default();
        assert_eq!(set.next_value(), 1);
        assert_eq!(set.add_new(Point2D::new(1.0, 1.0), T, INTERVAL), 1);
        assert_eq!(set.selected_index(), Some(0));
    }

    #[test]
    fn test_fills_smallest_hole() {
        let mut set = set_with_values(&[1, 2, 4]);
        assert_eq!(set.add_new(Point2D::new(0.0, 0.0), T, INTERVAL), 3);
        assert_eq!(set.values(), vec![1, 2, 3, 4]);
        assert_eq!(set.selected_index(), Some(2));
    }

    #[test]
    fn test_draw_as_selected_tool_outlines_no_member() {
        let set = set_with_values(&[1, 2, 3]);
        let mut list = DisplayList::new();
        set.draw(&mut list, &CoordinateTransform::identity(), true, T);

        let strokes = list
            .primitives()
            .iter()
            .filter(|p| matches!(p, Primitive::StrokeRoundedRect { .. }))
            .count();
        assert_eq!(strokes, 0);
        assert_eq!(list.texts(), vec!["1", "2", "3"]);
        assert_eq!(set.selected_index(), Some(2));
    }

    #[test]
    fn test_appends_after_max() {
        let mut set = set_with_values(&[1, 2, 3]);
        assert_eq!(set.add_new(Point2D::new(0.0, 0.0), T, INTERVAL), 4);
        assert_eq!(set.values(), vec![1, 2, 3, 4]);
        assert_eq!(set.selected_index(), Some(3));
    }

    #[test]
    fn test_leading_hole_is_filled_first() {
        let mut set = set_with_values(&[3, 7]);
        assert_eq!(set.add_new(Point2D::new(0.0, 0.0), T, INTERVAL), 1);
        assert_eq!(set.add_new(Point2D::new(0.0, 0.0), T, INTERVAL), 2);
        assert_eq!(set.add_new(Point2D::new(0.0, 0.0), T, INTERVAL), 4);
        assert_eq!(set.values(), vec![1, 2, 3, 4, 7]);
    }

    #[test]
    fn test_sequential_placement_is_contiguous() {
        let mut set = MarkerSet::default();
        for expected in 1..=10 {
            assert_eq!(set.add_new(Point2D::new(0.0, 0.0), T, INTERVAL), expected);
        }
        assert_eq!(set.values(), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_add_existing_keeps_order_and_selects() {
        let mut set = set_with_values(&[1, 5]);
        set.add_existing(NumberedMarker::new(3, Point2D::new(0.0, 0.0), T, INTERVAL));
        assert_eq!(set.values(), vec![1, 3, 5]);
        assert_eq!(set.selected_member().unwrap().value(), 3);
    }

    #[test]
    fn test_add_existing_drops_duplicates_and_zero() {
        let mut set = set_with_values(&[1, 2]);
        set.add_existing(NumberedMarker::new(2, Point2D::new(0.0, 0.0), T, INTERVAL));
        set.add_existing(NumberedMarker::new(0, Point2D::new(0.0, 0.0), T, INTERVAL));
        assert_eq!(set.values(), vec![1, 2]);
    }

    #[test]
    fn test_hit_test_lowest_value_wins() {
        let spot = Point2D::new(50.0, 50.0);
        let mut set = MarkerSet::default();
        set.add_existing(NumberedMarker::new(5, spot, T, INTERVAL));
        set.add_existing(NumberedMarker::new(2, spot, T, INTERVAL));
        set.clear_selection_for_test();

        let result = set.hit_test(spot, T);
        assert_eq!(result, HitResult::Body);
        assert_eq!(set.selected_member().unwrap().value(), 2);
    }

    #[test]
    fn test_hit_test_miss_keeps_selection() {
        let mut set = set_with_values(&[1, 2]);
        assert_eq!(set.selected_index(), Some(1));
        assert_eq!(set.hit_test(Point2D::new(-500.0, -500.0), T), HitResult::Miss);
        assert_eq!(set.selected_index(), Some(1));
    }

    #[test]
    fn test_hit_test_selects_hit_member() {
        let mut set = set_with_values(&[1, 2, 3]);
        // Second marker sits at (200, 100).
        assert!(set.hit_test(Point2D::new(200.0, 100.0), T).is_hit());
        assert_eq!(set.selected_member().unwrap().value(), 2);
    }

    #[test]
    fn test_remove_resets_selection() {
        let mut set = set_with_values(&[1, 2, 3]);
        let selected = set.selected_member().unwrap();
        assert!(set.remove(&selected));
        assert_eq!(set.selected_member(), None);
        assert_eq!(set.values(), vec![1, 2]);
    }

    #[test]
    fn test_remove_unknown_marker() {
        let mut set = set_with_values(&[1, 2]);
        let stranger = NumberedMarker::new(1, Point2D::new(0.0, 0.0), T, INTERVAL);
        assert!(!set.remove(&stranger));
        assert_eq!(set.count(), 2);
    }

    #[test]
    fn test_clear_empties_and_deselects() {
        let mut set = set_with_values(&[1, 2, 3]);
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.selected_index(), None);
        assert_eq!(set.next_value(), 1);
    }

    #[test]
    fn test_moves_without_selection_are_noops() {
        let mut set = set_with_values(&[1]);
        let before = set.iter().next().unwrap().position();
        set.clear_selection_for_test();
        set.move_drawing(10.0, 10.0, ModifierKeys::none());
        set.move_handle(Point2D::new(0.0, 0.0), LABEL_HANDLE);
        assert_eq!(set.iter().next().unwrap().position(), before);
    }

    #[test]
    fn test_moves_delegate_to_selected() {
        let mut set = set_with_values(&[1, 2]);
        set.hit_test(Point2D::new(100.0, 100.0), T);
        set.move_drawing(5.0, 5.0, ModifierKeys::none());
        assert_eq!(set.selected_member().unwrap().position(), Point2D::new(105.0, 105.0));

        set.move_handle(Point2D::new(7.0, 8.0), LABEL_HANDLE);
        assert_eq!(set.selected_member().unwrap().position(), Point2D::new(7.0, 8.0));
        // The other marker did not move.
        assert_eq!(set.iter().nth(1).unwrap().position(), Point2D::new(200.0, 100.0));
    }

    #[test]
    fn test_fading_is_not_supported() {
        let mut set = MarkerSet::default();
        assert!(matches!(set.fading(), Err(CoreError::NotSupported(_))));
        assert!(matches!(
            set.set_fading(FadeDescriptor::new(0, 1)),
            Err(CoreError::NotSupported(_))
        ));
    }

    #[test]
    fn test_capabilities_and_name() {
        let set = MarkerSet::default();
        assert!(set.capabilities().is_none());
        assert!(Drawable::capabilities(&set).is_none());
        assert_eq!(set.display_name(), "Numbered markers");
        assert_eq!(set.to_string(), "Numbered markers");
    }

    #[test]
    fn test_draw_all_members_in_order() {
        let set = set_with_values(&[1, 2, 3]);
        let mut list = DisplayList::new();
        set.draw(&mut list, &CoordinateTransform::identity(), false, T);
        assert_eq!(list.texts(), vec!["1", "2", "3"]);
        assert_eq!(set.selected_index(), Some(2));
    }

    #[test]
    fn test_bad_payload_is_ignored() {
        let mut set = set_with_values(&[1, 2]);
        let before = set.values();

        MultiDrawing::add_item(&mut set, Box::new("not a marker"));
        MultiDrawing::remove_item(&mut set, &42_u32);

        assert_eq!(MultiDrawing::count(&set), 2);
        assert_eq!(set.values(), before);
    }

    #[test]
    fn test_add_item_ignores_colliding_value() {
        let mut set = set_with_values(&[1, 2]);
        let clash = NumberedMarker::new(2, Point2D::new(900.0, 900.0), T, INTERVAL);

        MultiDrawing::add_item(&mut set, Box::new(clash));

        assert_eq!(set.values(), vec![1, 2]);
        assert_eq!(set.iter().nth(1).unwrap().position(), Point2D::new(200.0, 100.0));
    }

    #[test]
    fn test_multi_drawing_round_trip_of_selected_item() {
        let mut set = set_with_values(&[1, 2, 3]);
        let item = set.selected_item().unwrap();
        let marker = item.downcast_ref::<NumberedMarker>().unwrap().clone();

        MultiDrawing::remove_item(&mut set, &marker);
        assert_eq!(set.values(), vec![1, 2]);

        MultiDrawing::add_item(&mut set, Box::new(marker));
        assert_eq!(set.values(), vec![1, 2, 3]);
        assert_eq!(set.selected_member().unwrap().value(), 3);
    }

    #[test]
    fn test_fragment_round_trip() {
        let mut set = MarkerSet::default();
        set.add_existing(NumberedMarker::new(3, Point2D::new(20.0, 5.0), 2000, INTERVAL));
        set.add_existing(NumberedMarker::new(1, Point2D::new(10.0, 10.0), 1000, INTERVAL));

        let json = serde_json::to_string(&set.write_fragment()).unwrap();
        assert!(json.contains("\"numberedMarker\""));

        let parsed: Vec<FragmentElement> = serde_json::from_str(&json).unwrap();
        let mut restored = MarkerSet::default();
        assert_eq!(restored.read_fragment(&parsed), 2);

        let pairs: Vec<(u32, Point2D)> = restored
            .iter()
            .map(|m| (m.value(), m.position()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (1, Point2D::new(10.0, 10.0)),
                (3, Point2D::new(20.0, 5.0))
            ]
        );
        assert_eq!(restored.selected_index(), None);
    }

    #[test]
    fn test_read_fragment_skips_invalid_and_duplicates() {
        let record = |value| MarkerRecord {
            value,
            position: Point2D::new(1.0, 1.0),
            placed_at: 0,
            frame_interval: 1,
        };
        let elements = vec![
            FragmentElement::NumberedMarker(record(2)),
            FragmentElement::NumberedMarker(record(0)),
            FragmentElement::NumberedMarker(record(2)),
            FragmentElement::NumberedMarker(record(1)),
        ];
        let mut set = MarkerSet::default();
        assert_eq!(set.read_fragment(&elements), 2);
        assert_eq!(set.values(), vec![1, 2]);
    }

    #[test]
    fn test_random_add_remove_sequences_hold_invariants() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut set = MarkerSet::default();

        for _ in 0..2000 {
            if set.is_empty() || rng.gen_bool(0.6) {
                let expected = smallest_missing(&set.values());
                let value = set.add_new(Point2D::new(0.0, 0.0), T, INTERVAL);
                assert_eq!(value, expected);
                assert_eq!(set.selected_member().unwrap().value(), value);
            } else {
                let index = rng.gen_range(0..set.count());
                let victim = set.iter().nth(index).cloned().unwrap();
                assert!(set.remove(&victim));
                assert!(!set.contains_value(victim.value()));
                assert_eq!(set.selected_index(), None);
            }
            assert_invariants(&set);
        }
    }

    impl MarkerSet {
        fn clear_selection_for_test(&mut self) {
            self.selected = None;
        }
    }
}

use sprite_atlas_core::dedup::{DuplicateIndex, Lookup, PixelContent};
use sprite_atlas_core::model::Rect;
use sprite_atlas_core::pixels::PixelBuffer;

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    rgba.iter()
        .copied()
        .cycle()
        .take((w * h * 4) as usize)
        .collect()
}

/// Owned contents addressed by position, standing in for retained frames.
struct Store(Vec<(u32, u32, Vec<u8>)>);

impl Store {
    fn content(&self, i: usize) -> PixelContent<'_> {
        let (w, h, px) = &self.0[i];
        PixelContent::new(*w, *h, px)
    }

    /// Registers item `i` (looked up by its own position as key).
    fn register(&self, index: &mut DuplicateIndex<usize>, i: usize) -> Lookup {
        index.lookup_or_register(self.content(i), i, |&k| self.content(k))
    }
}

#[test]
fn identical_content_resolves_to_first_entry() {
    let a = solid(4, 4, [1, 2, 3, 255]);
    let store = Store(vec![(4, 4, a.clone()), (4, 4, a)]);
    let mut index = DuplicateIndex::new();

    assert_eq!(store.register(&mut index, 0), Lookup::Registered(0));
    assert_eq!(store.register(&mut index, 1), Lookup::Existing(0));
    assert_eq!(index.len(), 1);
    assert_eq!(index.hits(), 1);
    assert_eq!(index.key(0), Some(&0));
}

#[test]
fn lookup_is_idempotent() {
    let store = Store(vec![(3, 2, solid(3, 2, [9, 9, 9, 128]))]);
    let mut index = DuplicateIndex::new();
    let entry = store.register(&mut index, 0).entry();
    for _ in 0..5 {
        assert_eq!(store.register(&mut index, 0), Lookup::Existing(entry));
        assert_eq!(index.lookup(&store.content(0), |&k| store.content(k)), Some(entry));
    }
    assert_eq!(index.len(), 1);
}

#[test]
fn single_byte_difference_is_a_new_entry() {
    let a = solid(4, 4, [1, 2, 3, 255]);
    let mut b = a.clone();
    b[37] ^= 1;
    let store = Store(vec![(4, 4, a), (4, 4, b)]);
    let mut index = DuplicateIndex::new();
    store.register(&mut index, 0);
    let r = store.register(&mut index, 1);
    assert_eq!(r, Lookup::Registered(1));
    assert!(!r.is_existing());
    assert_eq!(index.hits(), 0);
}

#[test]
fn same_bytes_with_other_dimensions_are_distinct() {
    let px = solid(2, 8, [5, 5, 5, 255]);
    let store = Store(vec![(2, 8, px.clone()), (8, 2, px)]);
    let mut index = DuplicateIndex::new();
    let tall = store.register(&mut index, 0);
    let wide = store.register(&mut index, 1);
    assert_ne!(tall.entry(), wide.entry());
    assert_ne!(store.content(0).digest(), store.content(1).digest());
}

#[test]
fn entries_are_dense_in_registration_order() {
    let store = Store(
        (0..7u8)
            .map(|i| (2, 2, solid(2, 2, [i, 0, 0, 255])))
            .collect(),
    );
    let mut index = DuplicateIndex::new();
    for i in 0..6 {
        assert_eq!(store.register(&mut index, i), Lookup::Registered(i));
    }
    let resolve = |&k: &usize| store.content(k);
    assert_eq!(index.lookup(&store.content(3), resolve), Some(3));
    assert!(index.lookup(&store.content(6), resolve).is_none());
}

#[test]
fn sub_rect_views_compare_by_pixels_not_by_position() {
    // Same 2x2 pattern at (1, 1) and (5, 2) of a wider buffer.
    let mut raw = solid(8, 5, [0, 0, 0, 0]);
    for (ox, oy) in [(1usize, 1usize), (5, 2)] {
        for (dy, dx, v) in [(0, 0, 10u8), (0, 1, 20), (1, 0, 30), (1, 1, 40)] {
            let i = ((oy + dy) * 8 + ox + dx) * 4;
            raw[i..i + 4].copy_from_slice(&[v, v, v, 255]);
        }
    }
    let buf = PixelBuffer::from_raw(8, 5, raw).unwrap();
    let left = buf.content(&Rect::new(1, 1, 2, 2));
    let right = buf.content(&Rect::new(5, 2, 2, 2));
    let shifted = buf.content(&Rect::new(5, 1, 2, 2));

    assert!(left.same_as(&right));
    assert_eq!(left.digest(), right.digest());
    assert!(!left.same_as(&shifted));

    let packed: Vec<u8> = [10u8, 20, 30, 40]
        .iter()
        .flat_map(|&v| [v, v, v, 255])
        .collect();
    let tight = PixelContent::new(2, 2, &packed);
    assert!(tight.same_as(&left));
    assert_eq!(tight.digest(), left.digest());
}

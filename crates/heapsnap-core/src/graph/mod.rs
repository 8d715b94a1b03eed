//! Object graph reconstruction
//!
//! Starting from GC roots and static fields, every reachable address is
//! resolved to a [`ManagedObject`] and each "X references Y via field F" edge
//! is recorded on both ends.

mod builder;
mod object;

pub use builder::{GraphBuilder, GraphParts};
pub use object::{ManagedObject, ObjectId, ReferenceFrom, ReferenceTo, UnresolvedReason};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureBuilder, RawCapture};
    use crate::config::AnalyzerConfig;
    use crate::error::Error;
    use crate::memory::{MemorySection, SectionIndex, VmLayout};
    use crate::snapshot::Snapshot;
    use crate::types::TypeCatalog;

    fn build(builder: &CaptureBuilder) -> Snapshot {
        Snapshot::build(builder.build(), &AnalyzerConfig::default()).unwrap()
    }

    /// Decoded pieces of a capture, for driving a [`GraphBuilder`] directly
    struct Decoded {
        layout: VmLayout,
        sections: SectionIndex,
        types: TypeCatalog,
    }

    fn decode(capture: RawCapture) -> Decoded {
        let layout = capture.layout.to_layout().unwrap();
        let sections = SectionIndex::new(
            capture.sections.into_iter().map(MemorySection::from).collect(),
            &layout,
        )
        .unwrap();
        let types = TypeCatalog::new(capture.types, &layout).unwrap();
        Decoded {
            layout,
            sections,
            types,
        }
    }

    fn linked_nodes(builder: &mut CaptureBuilder) -> usize {
        let node = builder.add_class("Node", "Game", None);
        builder.add_field(node, "next", node);
        node
    }

    #[test]
    fn test_analyze_object_is_idempotent() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let node = linked_nodes(&mut builder);
        let a = builder.alloc_object(node);
        let b = builder.alloc_object(node);
        builder.set_field(a, node, "next", b);

        let decoded = decode(builder.build());
        let config = AnalyzerConfig::default();
        let mut graph = GraphBuilder::new(&decoded.layout, &decoded.sections, &decoded.types, &config);

        let first = graph.analyze_object(b).unwrap().unwrap();
        let second = graph.analyze_object(b).unwrap().unwrap();
        assert_eq!(first, second);
        assert!(std::ptr::eq(graph.object(first), graph.object(second)));

        // Reaching b again through a does not create a second object
        let root = graph.analyze_object(a).unwrap().unwrap();
        assert_eq!(graph.object_count(), 2);
        assert_eq!(graph.object(root).references_to()[0].address, b);
        assert_eq!(graph.analyze_object(b).unwrap(), Some(first));
    }

    #[test]
    fn test_shared_child_reached_by_two_paths() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let node = builder.add_class("Node", "Game", None);
        builder.add_field(node, "left", node);
        builder.add_field(node, "right", node);
        let root = builder.alloc_object(node);
        let shared = builder.alloc_object(node);
        builder.set_field(root, node, "left", shared);
        builder.set_field(root, node, "right", shared);
        builder.add_root(root);

        let snapshot = build(&builder);
        assert_eq!(snapshot.len(), 2);

        let child = snapshot.object(shared).unwrap();
        let paths: Vec<&ReferenceFrom> = child.references_from().iter().collect();
        assert_eq!(paths.len(), 2);
        assert!(paths.contains(&&ReferenceFrom::Object {
            address: root,
            path: "left".to_string()
        }));
        assert!(paths.contains(&&ReferenceFrom::Object {
            address: root,
            path: "right".to_string()
        }));
    }

    #[test]
    fn test_mutual_cycle_terminates() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let node = linked_nodes(&mut builder);
        let a = builder.alloc_object(node);
        let b = builder.alloc_object(node);
        builder.set_field(a, node, "next", b);
        builder.set_field(b, node, "next", a);
        builder.add_root(a);

        let snapshot = build(&builder);
        assert_eq!(snapshot.len(), 2);

        let obj_a = snapshot.object(a).unwrap();
        let obj_b = snapshot.object(b).unwrap();
        assert_eq!(obj_a.references_to(), &[ReferenceTo { path: "next".to_string(), address: b }]);
        assert_eq!(obj_b.references_to(), &[ReferenceTo { path: "next".to_string(), address: a }]);
        assert_eq!(
            obj_a.references_from(),
            &[
                ReferenceFrom::GcRoot { index: 0 },
                ReferenceFrom::Object {
                    address: b,
                    path: "next".to_string()
                }
            ]
        );
        assert_eq!(obj_b.references_from().len(), 1);
    }

    #[test]
    fn test_self_reference() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let node = linked_nodes(&mut builder);
        let a = builder.alloc_object(node);
        builder.set_field(a, node, "next", a);
        builder.add_root(a);

        let snapshot = build(&builder);
        assert_eq!(snapshot.len(), 1);
        let obj = snapshot.object(a).unwrap();
        assert_eq!(obj.references_to()[0].address, a);
        assert_eq!(obj.references_from().len(), 2);
    }

    #[test]
    fn test_null_reference_is_recorded() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let node = linked_nodes(&mut builder);
        let a = builder.alloc_object(node);
        builder.add_root(a);

        let snapshot = build(&builder);
        let obj = snapshot.object(a).unwrap();
        assert_eq!(obj.references_to().len(), 1);
        assert!(obj.references_to()[0].is_null());
        assert_eq!(snapshot.unresolved_count(), 0);
    }

    #[test]
    fn test_array_size_law() {
        // 32-bit layout: array header is 16 bytes
        let mut builder = CaptureBuilder::new(VmLayout::mono_32());
        let int32 = builder.add_primitive("System.Int32", 4);
        let ints = builder.add_array("System.Int32[]", int32, 1);
        let array = builder.alloc_array(ints, 3);
        builder.add_root(array);

        let snapshot = build(&builder);
        let obj = snapshot.object(array).unwrap();
        assert_eq!(obj.size(), 16 + 4 * 3);
        assert!(obj.references_to().is_empty());
    }

    #[test]
    fn test_string_size_and_value() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let string = builder.add_string_type("System.String");
        let s = builder.alloc_string(string, "AB");
        builder.add_root(s);

        let snapshot = build(&builder);
        let obj = snapshot.object(s).unwrap();
        assert_eq!(obj.size(), 16 + 4 + (2 + 1) * 2);
        assert_eq!(obj.value(), Some("AB"));
    }

    #[test]
    fn test_empty_and_non_ascii_strings() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let string = builder.add_string_type("System.String");
        let empty = builder.alloc_string(string, "");
        let kana = builder.alloc_string(string, "ヒープ");
        builder.add_root(empty);
        builder.add_root(kana);

        let snapshot = build(&builder);
        let empty = snapshot.object(empty).unwrap();
        assert_eq!(empty.size(), 16 + 4 + 2);
        assert_eq!(empty.value(), Some(""));
        assert_eq!(snapshot.object(kana).unwrap().value(), Some("ヒープ"));
    }

    #[test]
    fn test_string_preview_is_truncated() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let string = builder.add_string_type("System.String");
        let s = builder.alloc_string(string, "abcdefghij");
        builder.add_root(s);

        let config = AnalyzerConfig::default().with_preview_length(4);
        let snapshot = Snapshot::build(builder.build(), &config).unwrap();
        let obj = snapshot.object(s).unwrap();
        assert_eq!(obj.value(), Some("abcd..."));
        // Size still reflects the full string
        assert_eq!(obj.size(), 16 + 4 + 11 * 2);
    }

    #[test]
    fn test_custom_string_type_name() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let string = builder.add_string_type("Lua.String");
        let s = builder.alloc_string(string, "hi");
        builder.add_root(s);

        let default_snapshot = build(&builder);
        assert_eq!(default_snapshot.object(s).unwrap().value(), None);

        let config = AnalyzerConfig::default().with_string_type("Lua.String");
        let snapshot = Snapshot::build(builder.build(), &config).unwrap();
        assert_eq!(snapshot.object(s).unwrap().value(), Some("hi"));
    }

    #[test]
    fn test_reference_array_elements() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let node = linked_nodes(&mut builder);
        let nodes = builder.add_array("Node[]", node, 1);
        let array = builder.alloc_array(nodes, 3);
        let first = builder.alloc_object(node);
        let third = builder.alloc_object(node);
        builder.set_element(array, 0, first);
        builder.set_element(array, 2, third);
        builder.add_root(array);

        let snapshot = build(&builder);
        let obj = snapshot.object(array).unwrap();
        assert_eq!(obj.size(), 32 + 8 * 3);

        let edges: Vec<(&str, u64)> = obj
            .references_to()
            .iter()
            .map(|r| (r.path.as_str(), r.address))
            .collect();
        assert_eq!(edges, vec![("[0]", first), ("[1]", 0), ("[2]", third)]);

        assert_eq!(
            snapshot.object(third).unwrap().references_from(),
            &[ReferenceFrom::Object {
                address: array,
                path: "[2]".to_string()
            }]
        );
    }

    #[test]
    fn test_value_type_array_elements() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let int32 = builder.add_primitive("System.Int32", 4);
        let node = linked_nodes(&mut builder);
        let entry = builder.add_struct("Entry", "Game");
        builder.add_field(entry, "key", int32);
        builder.add_field(entry, "value", node);
        let entries = builder.add_array("Entry[]", entry, 1);

        let array = builder.alloc_array(entries, 2);
        let target = builder.alloc_object(node);
        // Entry is 12 bytes unboxed: key at 0, value at 4
        let element_1 = array + 32 + 12;
        builder.write_pointer(element_1 + 4, target);
        builder.add_root(array);

        let snapshot = build(&builder);
        let obj = snapshot.object(array).unwrap();
        assert_eq!(obj.size(), 32 + 12 * 2);
        assert_eq!(
            obj.references_to(),
            &[
                ReferenceTo { path: "[0].value".to_string(), address: 0 },
                ReferenceTo { path: "[1].value".to_string(), address: target },
            ]
        );
    }

    #[test]
    fn test_multi_dimensional_array_uses_bounds_record() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let int32 = builder.add_primitive("System.Int32", 4);
        let grid = builder.add_array("System.Int32[,]", int32, 2);
        let array = builder.alloc_multi_array(grid, &[2, 3]);
        builder.add_root(array);

        let snapshot = build(&builder);
        assert_eq!(snapshot.object(array).unwrap().size(), 32 + 4 * 6);
    }

    #[test]
    fn test_unreadable_bounds_record_is_fatal() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let int32 = builder.add_primitive("System.Int32", 4);
        let grid = builder.add_array("System.Int32[,]", int32, 2);
        let array = builder.alloc_multi_array(grid, &[2, 2]);
        // Point the bounds record into unmapped memory
        builder.write_pointer(array + 16, 0xDEAD_0000);
        builder.add_root(array);

        let err = Snapshot::build(builder.build(), &AnalyzerConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedArray { address, .. } if address == array));
    }

    #[test]
    fn test_array_elements_clamped_to_section() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let node = linked_nodes(&mut builder);
        let nodes = builder.add_array("Node[]", node, 1);
        let array = builder.alloc_array(nodes, 2);
        let child = builder.alloc_object(node);
        builder.set_element(array, 0, child);
        // Claim far more elements than were captured
        builder.write_pointer(array + 24, 1_000_000);
        builder.add_root(array);

        let snapshot = build(&builder);
        let obj = snapshot.object(array).unwrap();
        assert_eq!(obj.size(), 32 + 8 * 1_000_000);
        assert!(snapshot.contains(child));
    }

    #[test]
    fn test_nested_value_type_field_paths() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let int32 = builder.add_primitive("System.Int32", 4);
        let node = linked_nodes(&mut builder);
        let inner = builder.add_struct("Inner", "Game");
        builder.add_field(inner, "count", int32);
        builder.add_field(inner, "target", node);
        let holder = builder.add_class("Holder", "Game", None);
        let outer_offset = builder.add_field(holder, "state", inner);

        let h = builder.alloc_object(holder);
        let target = builder.alloc_object(node);
        // Inner.target sits at boxed offset 20, i.e. 4 bytes into the embedded struct
        builder.write_pointer(h + outer_offset + 4, target);
        builder.add_root(h);

        let snapshot = build(&builder);
        assert_eq!(
            snapshot.object(h).unwrap().references_to(),
            &[ReferenceTo { path: "state.target".to_string(), address: target }]
        );
        assert_eq!(
            snapshot.object(target).unwrap().references_from(),
            &[ReferenceFrom::Object {
                address: h,
                path: "state.target".to_string()
            }]
        );
    }

    #[test]
    fn test_atomic_fields_produce_no_edges() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let int32 = builder.add_primitive("System.Int32", 4);
        let holder = builder.add_class("Holder", "Game", None);
        builder.add_field(holder, "a", int32);
        builder.add_field(holder, "b", int32);
        let h = builder.alloc_object(holder);
        builder.write_i32(h + 16, 0x1000_0000);
        builder.add_root(h);

        let snapshot = build(&builder);
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.object(h).unwrap().references_to().is_empty());
    }

    #[test]
    fn test_inherited_fields_are_walked() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let node = linked_nodes(&mut builder);
        let base = builder.add_class("Base", "Game", None);
        builder.add_field(base, "owner", node);
        let derived = builder.add_class("Derived", "Game", Some(base));
        builder.add_field(derived, "extra", node);

        let d = builder.alloc_object(derived);
        let owner = builder.alloc_object(node);
        let extra = builder.alloc_object(node);
        builder.set_field(d, derived, "owner", owner);
        builder.set_field(d, derived, "extra", extra);
        builder.add_root(d);

        let snapshot = build(&builder);
        let obj = snapshot.object(d).unwrap();
        assert_eq!(obj.size(), 32);
        let mut paths: Vec<&str> = obj.references_to().iter().map(|r| r.path.as_str()).collect();
        paths.sort_unstable();
        assert_eq!(paths, vec!["extra", "owner"]);
        assert!(snapshot.contains(owner) && snapshot.contains(extra));
    }

    #[test]
    fn test_unresolved_reasons_are_cached_and_walk_continues() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let holder = builder.add_class("Holder", "Game", None);
        for name in ["dangling", "bad_vtable", "bad_type", "good"] {
            builder.add_field(holder, name, holder);
        }

        let h = builder.alloc_object(holder);
        let good = builder.alloc_object(holder);

        // Vtable pointer outside every section
        let bad_vtable = builder.alloc_raw(48);
        builder.write_pointer(bad_vtable, 0xDEAD_0000);

        // Vtable inside the heap, but its type info is unknown
        let fake_vtable = builder.alloc_raw(16);
        builder.write_pointer(fake_vtable, 0x0999_9999);
        let bad_type = builder.alloc_raw(48);
        builder.write_pointer(bad_type, fake_vtable);

        builder.set_field(h, holder, "dangling", 0x7777_0000);
        builder.set_field(h, holder, "bad_vtable", bad_vtable);
        builder.set_field(h, holder, "bad_type", bad_type);
        builder.set_field(h, holder, "good", good);
        builder.add_root(h);
        // Second reference to the same bad pointer
        builder.set_field(good, holder, "dangling", 0x7777_0000);

        let snapshot = build(&builder);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.unresolved(0x7777_0000), Some(UnresolvedReason::SectionNotFound));
        assert_eq!(
            snapshot.unresolved(bad_vtable),
            Some(UnresolvedReason::VtableSectionNotFound)
        );
        assert_eq!(snapshot.unresolved(bad_type), Some(UnresolvedReason::TypeNotFound));
        assert_eq!(snapshot.unresolved_count(), 3);

        // Unresolved edges are omitted, the sibling is still linked
        let obj = snapshot.object(h).unwrap();
        assert_eq!(
            obj.references_to(),
            &[ReferenceTo { path: "good".to_string(), address: good }]
        );
    }

    #[test]
    fn test_unresolvable_root_is_skipped() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let node = linked_nodes(&mut builder);
        let a = builder.alloc_object(node);
        builder.add_root(0xBAD0_0000);
        builder.add_root(0);
        builder.add_root(a);

        let snapshot = build(&builder);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            snapshot.object(a).unwrap().references_from(),
            &[ReferenceFrom::GcRoot { index: 2 }]
        );
        assert_eq!(snapshot.unresolved(0xBAD0_0000), Some(UnresolvedReason::SectionNotFound));
    }

    #[test]
    fn test_static_fields_seed_the_walk() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let int32 = builder.add_primitive("System.Int32", 4);
        let node = linked_nodes(&mut builder);
        let pair = builder.add_struct("Pair", "Game");
        builder.add_field(pair, "id", int32);
        builder.add_field(pair, "item", node);

        let registry = builder.add_class("Registry", "Game", None);
        let instance = builder.add_static_field(registry, "Instance", node);
        let current = builder.add_static_field(registry, "Current", pair);

        let a = builder.alloc_object(node);
        let b = builder.alloc_object(node);
        builder.set_static_pointer(registry, instance, a);
        // Pair.item is 4 bytes into the struct
        builder.set_static_pointer(registry, current + 4, b);

        let snapshot = build(&builder);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.object(a).unwrap().references_from(),
            &[ReferenceFrom::Static {
                path: "Registry.Instance".to_string()
            }]
        );
        let from_b = &snapshot.object(b).unwrap().references_from()[0];
        assert_eq!(from_b.source_address(), 0);
        assert_eq!(
            from_b,
            &ReferenceFrom::Static {
                path: "Registry.Current.item".to_string()
            }
        );
    }

    #[test]
    fn test_thirty_two_bit_graph() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_32());
        let node = linked_nodes(&mut builder);
        let string = builder.add_string_type("System.String");
        let named = builder.add_class("Named", "Game", None);
        builder.add_field(named, "name", string);
        builder.add_field(named, "next", node);

        let n = builder.alloc_object(named);
        let s = builder.alloc_string(string, "AB");
        let a = builder.alloc_object(node);
        builder.set_field(n, named, "name", s);
        builder.set_field(n, named, "next", a);
        builder.add_root(n);

        let snapshot = build(&builder);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.object(n).unwrap().size(), 8 + 4 + 4);
        assert_eq!(snapshot.object(s).unwrap().size(), 8 + 4 + 3 * 2);
        assert_eq!(snapshot.object(s).unwrap().value(), Some("AB"));
    }

    #[test]
    fn test_deep_chain_does_not_overflow_stack() {
        const DEPTH: usize = 100_000;

        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let node = linked_nodes(&mut builder);
        let addresses: Vec<u64> = (0..DEPTH).map(|_| builder.alloc_object(node)).collect();
        for pair in addresses.windows(2) {
            builder.set_field(pair[0], node, "next", pair[1]);
        }
        builder.add_root(addresses[0]);

        let snapshot = build(&builder);
        assert_eq!(snapshot.len(), DEPTH);
        let last = snapshot.object(addresses[DEPTH - 1]).unwrap();
        assert_eq!(last.references_from()[0].source_address(), addresses[DEPTH - 2]);
    }

    #[test]
    fn test_value_type_embedding_itself_is_rejected() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let bad = builder.add_struct("Bad", "Game");
        builder.add_field_at(bad, "a", bad, 16);
        builder.add_field_at(bad, "b", bad, 16);
        let holder = builder.add_class("Holder", "Game", None);
        builder.add_field(holder, "bad", bad);
        let h = builder.alloc_object(holder);
        builder.add_root(h);

        let err = Snapshot::build(builder.build(), &AnalyzerConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidCapture(_)));
    }

    #[test]
    fn test_bounds_record_at_end_of_address_space_is_malformed() {
        const BOUNDS: u64 = 0xFFFF_FFFF_FFFF_FFF0;

        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let int32 = builder.add_primitive("System.Int32", 4);
        let grid = builder.add_array("System.Int32[,]", int32, 2);
        let array = builder.alloc_multi_array(grid, &[2, 2]);
        // Dimension 0 fits in the last 16 bytes, dimension 1 would wrap around
        let mut record = 2u64.to_le_bytes().to_vec();
        record.resize(16, 0);
        builder.add_section(BOUNDS, record);
        builder.write_pointer(array + 16, BOUNDS);
        builder.add_root(array);

        let err = Snapshot::build(builder.build(), &AnalyzerConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedArray { address, .. } if address == array));
    }

    #[test]
    fn test_array_at_end_of_address_space() {
        const TOP: u64 = 0xFFFF_FFFF_FFFF_FFE0;

        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let node = linked_nodes(&mut builder);
        let nodes = builder.add_array("Node[]", node, 1);
        // Header only: vtable, sync block, null bounds, length 0
        let mut bytes = builder.vtable_address(nodes).to_le_bytes().to_vec();
        bytes.resize(32, 0);
        builder.add_section(TOP, bytes);
        builder.add_root(TOP);

        let snapshot = build(&builder);
        let obj = snapshot.object(TOP).unwrap();
        assert_eq!(obj.size(), 32);
        assert!(obj.references_to().is_empty());
    }

    #[test]
    fn test_string_at_end_of_address_space_has_no_value() {
        const TOP: u64 = 0xFFFF_FFFF_FFFF_FFF8;

        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let string = builder.add_string_type("System.String");
        builder.add_section(TOP, builder.vtable_address(string).to_le_bytes().to_vec());
        builder.add_root(TOP);

        let snapshot = build(&builder);
        let obj = snapshot.object(TOP).unwrap();
        assert_eq!(obj.size(), 16 + 4 + 2);
        assert_eq!(obj.value(), None);
    }

    #[test]
    fn test_astral_preview_counts_characters() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let string = builder.add_string_type("System.String");
        let long = builder.alloc_string(string, "😀😀😀");
        let exact = builder.alloc_string(string, "😀😀");
        builder.add_root(long);
        builder.add_root(exact);

        let config = AnalyzerConfig::default().with_preview_length(2);
        let snapshot = Snapshot::build(builder.build(), &config).unwrap();
        assert_eq!(snapshot.object(long).unwrap().value(), Some("😀😀..."));
        assert_eq!(snapshot.object(exact).unwrap().value(), Some("😀😀"));
        // Six UTF-16 units plus the terminator
        assert_eq!(snapshot.object(long).unwrap().size(), 16 + 4 + 7 * 2);
    }

    #[test]
    fn test_string_cut_by_section_end_is_marked() {
        const START: u64 = 0x2000_0000;

        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let string = builder.add_string_type("System.String");
        // Declares ten chars but only "abc" was captured
        let mut bytes = builder.vtable_address(string).to_le_bytes().to_vec();
        bytes.resize(16, 0);
        bytes.extend_from_slice(&10i32.to_le_bytes());
        bytes.extend("abc".encode_utf16().flat_map(|u| u.to_le_bytes()));
        builder.add_section(START, bytes);
        builder.add_root(START);

        let snapshot = build(&builder);
        let obj = snapshot.object(START).unwrap();
        assert_eq!(obj.value(), Some("abc..."));
        assert_eq!(obj.size(), 16 + 4 + 11 * 2);
    }
}

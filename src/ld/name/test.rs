// Tests for full-name reconstruction
//
//  Copyright (C) 2014-2023 Ryan Specialty, LLC.
//
//  This file is part of TAME.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

use super::*;
use crate::obj::{Export, Import};
use crate::sym::SymbolIndex;
use proptest::prelude::*;

fn export(
    symbols: &mut SymbolTable,
    name: &str,
    owner: ObjectRef,
    class: ObjectRef,
) -> Export {
    Export {
        name: symbols.intern(name),
        owner,
        class,
        ..Default::default()
    }
}

/// Exports `Seg0`..`SegN` each owned by the previous one.
fn export_chain(depth: usize) -> (SymbolTable, ObjectTables) {
    let mut symbols = SymbolTable::new();
    let mut tables = ObjectTables::new();
    let mut owner = ObjectRef::NULL;

    for i in 0..depth {
        let name = format!("Seg{i}");
        let seg = export(&mut symbols, &name, owner, ObjectRef::NULL);
        owner = tables.push_export(seg);
    }

    (symbols, tables)
}

#[test]
fn top_level_export_with_null_class_uses_meta_class() {
    // symbols exactly as they would be read from a container
    let mut symbols = SymbolTable::default();
    symbols.intern("Root");
    symbols.intern("Leaf");

    let mut tables = ObjectTables::new();
    tables.push_export(Export {
        name: SymbolIndex::new(1),
        ..Default::default()
    });

    assert_eq!(
        "Class Leaf",
        export_full_name(&symbols, &tables, ExportIndex::new(0)).unwrap()
    );
}

#[test]
fn import_owned_by_export_prefixes_export_name() {
    let mut symbols = SymbolTable::new();
    let mut tables = ObjectTables::new();

    let first = export(&mut symbols, "First", ObjectRef::NULL, ObjectRef::NULL);
    tables.push_export(first);

    let parent =
        export(&mut symbols, "Parent", ObjectRef::NULL, ObjectRef::NULL);
    let parent_ref = tables.push_export(parent);
    assert_eq!(2, parent_ref.raw());

    let widget = symbols.intern("Widget");
    let core = symbols.intern("Core");
    let child = symbols.intern("Child");
    tables.push_import(Import::new(core, widget, parent_ref, child));

    assert_eq!(
        "Widget Parent.Child",
        import_full_name(&symbols, &tables, ImportIndex::new(0)).unwrap()
    );
}

#[test]
fn import_chain_includes_every_import_owner() {
    let mut symbols = SymbolTable::new();
    let mut tables = ObjectTables::new();

    let (core, package, class) = (
        symbols.intern("Core"),
        symbols.intern("Package"),
        symbols.intern("Class"),
    );

    let pkg = symbols.intern("Engine");
    let pkg_ref =
        tables.push_import(Import::new(core, package, ObjectRef::NULL, pkg));

    let actor = symbols.intern("Actor");
    tables.push_import(Import::new(core, class, pkg_ref, actor));

    let sut = ImportIndex::new(1);

    assert_eq!(
        vec!["Engine", "Actor"],
        import_path(&symbols, &tables, sut).unwrap()
    );
    assert_eq!(
        "Class Engine.Actor",
        import_full_name(&symbols, &tables, sut).unwrap()
    );
    assert_eq!(
        "Package Engine",
        import_full_name(&symbols, &tables, ImportIndex::new(0)).unwrap()
    );
}

#[test]
fn export_class_may_be_an_import() {
    let mut symbols = SymbolTable::new();
    let mut tables = ObjectTables::new();

    let (core, class, name) = (
        symbols.intern("Core"),
        symbols.intern("Class"),
        symbols.intern("Texture"),
    );
    let class_ref =
        tables.push_import(Import::new(core, class, ObjectRef::NULL, name));

    let tex = export(&mut symbols, "Brick", ObjectRef::NULL, class_ref);
    tables.push_export(tex);

    assert_eq!(
        "Texture Brick",
        export_full_name(&symbols, &tables, ExportIndex::new(0)).unwrap()
    );
}

#[test]
fn export_class_may_be_an_export() {
    let mut symbols = SymbolTable::new();
    let mut tables = ObjectTables::new();

    let class =
        export(&mut symbols, "Widget", ObjectRef::NULL, ObjectRef::NULL);
    let class_ref = tables.push_export(class);

    let obj = export(&mut symbols, "Knob", class_ref, class_ref);
    tables.push_export(obj);

    assert_eq!(
        "Widget Widget.Knob",
        export_full_name(&symbols, &tables, ExportIndex::new(1)).unwrap()
    );
}

#[test]
fn export_owned_by_import_is_bad_reference() {
    let mut symbols = SymbolTable::new();
    let mut tables = ObjectTables::new();

    let name = symbols.intern("Elsewhere");
    let import_ref = tables.push_import(Import::new(
        SymbolIndex::NONE,
        SymbolIndex::NONE,
        ObjectRef::NULL,
        name,
    ));

    let obj = export(&mut symbols, "Stray", import_ref, ObjectRef::NULL);
    tables.push_export(obj);

    assert!(matches!(
        export_path(&symbols, &tables, ExportIndex::new(0)),
        Err(LinkError::BadReference(-1))
    ));
}

#[test]
fn cyclic_export_owner_chain_fails() {
    let mut symbols = SymbolTable::new();
    let mut tables = ObjectTables::new();

    let a = export(&mut symbols, "A", ObjectRef::from_raw(2), ObjectRef::NULL);
    let b = export(&mut symbols, "B", ObjectRef::from_raw(1), ObjectRef::NULL);
    tables.push_export(a);
    tables.push_export(b);

    let start = ExportIndex::new(0);

    assert!(matches!(
        export_full_name(&symbols, &tables, start),
        Err(LinkError::OwnerCycle(oref)) if oref == ObjectRef::export(start)
    ));
}

#[test]
fn cyclic_import_owner_chain_fails() {
    let mut symbols = SymbolTable::new();
    let mut tables = ObjectTables::new();

    let name = symbols.intern("Loop");
    tables.push_import(Import::new(
        SymbolIndex::NONE,
        SymbolIndex::NONE,
        ObjectRef::from_raw(-1),
        name,
    ));

    assert!(matches!(
        import_path(&symbols, &tables, ImportIndex::new(0)),
        Err(LinkError::OwnerCycle(_))
    ));
}

#[test]
fn missing_owner_is_bad_reference() {
    let mut symbols = SymbolTable::new();
    let mut tables = ObjectTables::new();

    let obj =
        export(&mut symbols, "Orphan", ObjectRef::from_raw(9), ObjectRef::NULL);
    tables.push_export(obj);

    assert!(matches!(
        export_path(&symbols, &tables, ExportIndex::new(0)),
        Err(LinkError::BadReference(9))
    ));
}

proptest! {
    /// The export walk includes the export itself,
    ///   so a chain of `depth` exports yields `depth` names.
    #[test]
    fn export_walk_includes_start(depth in 1usize..24) {
        let (symbols, tables) = export_chain(depth);
        let leaf = ExportIndex::from(depth - 1);

        let path = export_path(&symbols, &tables, leaf).unwrap();
        let expected: Vec<String> =
            (0..depth).map(|i| format!("Seg{i}")).collect();

        prop_assert_eq!(expected, path);
    }

    /// The import walk also includes the import itself and continues
    ///   through export owners.
    #[test]
    fn import_walk_continues_through_exports(depth in 1usize..24) {
        let (mut symbols, mut tables) = export_chain(depth);

        let name = symbols.intern("Tail");
        let owner = ObjectRef::export(ExportIndex::from(depth - 1));
        tables.push_import(Import::new(
            SymbolIndex::NONE,
            SymbolIndex::NONE,
            owner,
            name,
        ));

        let path =
            import_path(&symbols, &tables, ImportIndex::new(0)).unwrap();

        prop_assert_eq!(depth + 1, path.len());
        prop_assert_eq!(Some(&"Seg0"), path.first());
        prop_assert_eq!(Some(&"Tail"), path.last());
    }
}

// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slot placement, layouts, reconciliation and pagination.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use coffer_view::{
    Error, Frame, ItemBuilder, MemoryContainer, PageSwitch, PageTarget, PaginationBuilder,
    Placement, View, ViewConfig,
};

use common::{ALICE, at, item, shown};

fn bordered() -> ViewConfig {
    ViewConfig::rows(3).layout(["xxxxxxxxx", "xOOOOOOOx", "xxxxxxxxx"])
}

#[test]
fn layout_characters_place_items() {
    let mut frame = Frame::new();
    let mut view = View::new(bordered());
    view.layout_slot('x', |index| item(if index % 2 == 0 { "glass" } else { "pane" }))
        .available_slot(item("a").key("a"))
        .available_slot(item("b").key("b"));
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(27), ()).unwrap();

    let shown = shown(&frame, ALICE);
    assert_eq!(shown.len(), 22);
    assert_eq!(at(&frame, ALICE, 0).as_deref(), Some("glass"));
    assert_eq!(at(&frame, ALICE, 1).as_deref(), Some("pane"));
    assert_eq!(at(&frame, ALICE, 10).as_deref(), Some("a"));
    assert_eq!(at(&frame, ALICE, 11).as_deref(), Some("b"));
    assert_eq!(at(&frame, ALICE, 12), None);

    let session = frame.session(ALICE).unwrap();
    let border = session.component_at(26).and_then(|c| c.parent()).unwrap();
    assert_eq!(session.get(border).unwrap().layout_character(), Some('x'));
}

#[test]
fn layouts_overflow_loudly() {
    let mut frame = Frame::new();
    let mut view = View::new(bordered());
    for n in 0..8 {
        view.available_slot(item(&n.to_string()));
    }
    let menu = frame.register(view).unwrap();
    let err = frame
        .open(menu, ALICE, MemoryContainer::new(27), ())
        .unwrap_err();
    assert!(matches!(err, Error::LayoutOverflow { character: 'O' }));
    assert!(!frame.is_open(ALICE));

    let mut view = View::new(bordered());
    view.layout_slot('z', |_| item("never"));
    let menu = frame.register(view).unwrap();
    let err = frame
        .open(menu, ALICE, MemoryContainer::new(27), ())
        .unwrap_err();
    assert!(matches!(err, Error::LayoutOverflow { character: 'z' }));

    let mut view = View::<String>::new(ViewConfig::rows(1));
    view.component(item("lost").placed(Placement::Layout('q')));
    let menu = frame.register(view).unwrap();
    assert!(matches!(
        frame.open(menu, ALICE, MemoryContainer::new(9), ()),
        Err(Error::LayoutOverflow { character: 'q' })
    ));
}

#[test]
fn available_slots_skip_fixed_and_reserved() {
    let mut frame = Frame::new();
    let mut view = View::new(ViewConfig::rows(1));
    view.available_slot(item("first"))
        .slot(1, item("fixed"))
        .available_slot(item("second"))
        .available_slot(item("third"));
    let menu = frame.register(view).unwrap();
    let container = MemoryContainer::new(9).with_reserved(0);
    frame.open(menu, ALICE, container, ()).unwrap();

    assert_eq!(
        shown(&frame, ALICE),
        [
            (1, "fixed".to_string()),
            (2, "first".to_string()),
            (3, "second".to_string()),
            (4, "third".to_string()),
        ]
    );
}

#[test]
fn duplicate_keys_fail_the_open() {
    let mut frame = Frame::new();
    let mut view = View::new(ViewConfig::rows(1));
    view.slot(0, item("one").key("same"))
        .slot(1, item("two").key("same"));
    let menu = frame.register(view).unwrap();

    let err = frame
        .open(menu, ALICE, MemoryContainer::new(9), ())
        .unwrap_err();
    assert!(matches!(&err, Error::DuplicateKey { key } if key == "same"));
    assert!(!frame.is_open(ALICE));
}

#[test]
fn items_need_something_to_render() {
    let mut frame = Frame::<String>::new();
    let mut view = View::new(ViewConfig::rows(1));
    view.slot(3, ItemBuilder::new().key("blank"));
    let menu = frame.register(view).unwrap();

    let err = frame
        .open(menu, ALICE, MemoryContainer::new(9), ())
        .unwrap_err();
    assert!(matches!(
        &err,
        Error::MissingRenderPayload { key, slot: Some(3) } if key == "blank"
    ));

    // A reserved slot belongs to the platform: nothing to write.
    frame
        .open(menu, ALICE, MemoryContainer::new(9).with_reserved(3), ())
        .unwrap();
    let blank = frame.session(ALICE).unwrap().component("blank").unwrap();
    assert!(blank.is_visible());
    assert_eq!(at(&frame, ALICE, 3), None);
}

#[test]
fn render_handlers_may_pick_the_slot() {
    let mut frame = Frame::new();
    let mut view = View::new(ViewConfig::rows(1));
    view.component(
        ItemBuilder::new()
            .key("floating")
            .render_with(|ctx| ctx.set_item("nowhere".to_string())),
    );
    let menu = frame.register(view).unwrap();
    let err = frame
        .open(menu, ALICE, MemoryContainer::new(9), ())
        .unwrap_err();
    assert!(matches!(&err, Error::MissingPosition { key } if key == "floating"));

    let mut view = View::new(ViewConfig::rows(1));
    view.component(ItemBuilder::new().render_with(|ctx| {
        ctx.set_slot(6);
        ctx.set_item("placed".to_string());
    }));
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();
    assert_eq!(shown(&frame, ALICE), [(6, "placed".to_string())]);
}

#[test]
fn items_move_with_their_state() {
    let mut frame = Frame::new();
    let target = frame.state("target", 0_usize);

    let mut view = View::new(ViewConfig::rows(1));
    view.slot(
        0,
        ItemBuilder::new()
            .key("cursor")
            .watch(target)
            .render_with(move |ctx| {
                let slot = *ctx.get(target);
                ctx.set_slot(slot);
                ctx.set_item("cursor".to_string());
            }),
    )
    .slot(5, item("wall").key("wall"));
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();

    frame.set_state(target, 2).unwrap();
    assert_eq!(
        shown(&frame, ALICE),
        [(2, "cursor".to_string()), (5, "wall".to_string())]
    );

    let err = frame.set_state(target, 5).unwrap_err();
    assert!(matches!(
        &err,
        Error::SlotCollision { key, slot: 5, occupant } if key == "cursor" && occupant == "wall"
    ));
    let session = frame.session(ALICE).unwrap();
    assert_eq!(session.component("cursor").unwrap().position(), Some(2));
    assert_eq!(at(&frame, ALICE, 2).as_deref(), Some("cursor"));
    assert_eq!(at(&frame, ALICE, 5).as_deref(), Some("wall"));
}

#[test]
fn shared_slots_keep_the_last_write() {
    let mut frame = Frame::new();
    let mut view = View::new(ViewConfig::rows(1));
    view.slot(3, item("a").key("a")).slot(3, item("b").key("b"));
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();
    assert_eq!(at(&frame, ALICE, 3).as_deref(), Some("b"));

    frame.hide(ALICE, "a").unwrap();
    assert_eq!(at(&frame, ALICE, 3).as_deref(), Some("b"));

    frame.hide(ALICE, "b").unwrap();
    assert_eq!(at(&frame, ALICE, 3), None);
}

fn letters() -> View<String> {
    let mut view = View::new(ViewConfig::rows(1));
    view.component(
        PaginationBuilder::from_items(vec!["a", "b", "c", "d", "e"], |s: &&str, _| item(s))
            .key("letters")
            .target(PageTarget::Slots(vec![0, 1])),
    );
    view
}

#[test]
fn pages_switch_and_clamp() {
    let mut frame = Frame::new();
    let menu = frame.register(letters()).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();

    let page = frame.session(ALICE).unwrap().component("letters").unwrap().page().unwrap();
    assert_eq!((page.page, page.page_count, page.len, page.page_size), (0, 3, 5, 2));
    assert!(page.has_next());
    assert_eq!(
        shown(&frame, ALICE),
        [(0, "a".to_string()), (1, "b".to_string())]
    );

    let page = frame.paginate(ALICE, "letters", PageSwitch::Next).unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(
        shown(&frame, ALICE),
        [(0, "c".to_string()), (1, "d".to_string())]
    );

    let page = frame.paginate(ALICE, "letters", PageSwitch::To(9)).unwrap();
    assert_eq!(page.page, 2);
    assert!(!page.has_next());
    assert_eq!(shown(&frame, ALICE), [(0, "e".to_string())]);

    assert_eq!(
        frame.paginate(ALICE, "letters", PageSwitch::Next).unwrap().page,
        2
    );
    assert_eq!(
        frame.paginate(ALICE, "letters", PageSwitch::Previous).unwrap().page,
        1
    );
    // Only the current page's items are alive.
    assert_eq!(frame.session(ALICE).unwrap().len(), 3);
}

#[test]
fn providers_rebuild_on_watched_changes() {
    let mut frame = Frame::new();
    let stock = frame.state("stock", vec!["axe".to_string()]);

    let mut view = View::new(ViewConfig::rows(1));
    view.component(
        PaginationBuilder::from_provider(move |ctx| ctx.get(stock).clone(), |s: &String, _| {
            item(s)
        })
        .key("stock")
        .watch(stock)
        .target(PageTarget::Slots(vec![0, 1, 2])),
    );
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();
    assert_eq!(shown(&frame, ALICE), [(0, "axe".to_string())]);

    frame
        .update_state(stock, |s| {
            s.push("bow".to_string());
            s.push("rope".to_string());
        })
        .unwrap();
    assert_eq!(
        shown(&frame, ALICE),
        [
            (0, "axe".to_string()),
            (1, "bow".to_string()),
            (2, "rope".to_string()),
        ]
    );

    frame.set_state(stock, Vec::new()).unwrap();
    assert!(shown(&frame, ALICE).is_empty());
    let page = frame.session(ALICE).unwrap().component("stock").unwrap().page().unwrap();
    assert_eq!((page.page_count, page.len), (1, 0));
}

#[test]
fn cancelled_switches_keep_the_page() {
    let mut frame = Frame::new();
    let attempts = Rc::new(RefCell::new(Vec::new()));
    let mut view = View::new(ViewConfig::rows(1));
    view.component({
        let attempts = attempts.clone();
        PaginationBuilder::from_items(vec![1_u32, 2, 3, 4], |n: &u32, _| item(&n.to_string()))
            .key("numbers")
            .target(PageTarget::Slots(vec![4]))
            .on_page_switch(move |ctx| {
                let page = ctx.page().unwrap().page;
                attempts.borrow_mut().push(page);
                if page == 3 {
                    ctx.cancel();
                }
            })
    });
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();

    frame.paginate(ALICE, "numbers", PageSwitch::To(2)).unwrap();
    assert_eq!(at(&frame, ALICE, 4).as_deref(), Some("3"));

    let page = frame.paginate(ALICE, "numbers", PageSwitch::Next).unwrap();
    assert_eq!(page.page, 2);
    assert_eq!(at(&frame, ALICE, 4).as_deref(), Some("3"));
    assert_eq!(*attempts.borrow(), [2, 3]);
}

#[test]
fn only_paginations_switch_pages() {
    let mut frame = Frame::new();
    let mut view = letters();
    view.slot(8, item("plain").key("plain"));
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();

    let err = frame
        .paginate(ALICE, "plain", PageSwitch::Next)
        .unwrap_err();
    assert!(matches!(&err, Error::NotPaginated { key } if key == "plain"));
    assert!(matches!(
        frame.paginate(ALICE, "missing", PageSwitch::Next),
        Err(Error::UnknownComponent { .. })
    ));
}

#[test]
fn a_failed_move_does_not_stall_other_watchers() {
    let mut frame = Frame::new();
    let target = frame.state("target", 0_usize);

    let mut view = View::new(ViewConfig::rows(1));
    view.slot(
        0,
        ItemBuilder::new()
            .key("cursor")
            .watch(target)
            .render_with(move |ctx| {
                let slot = *ctx.get(target);
                ctx.set_slot(slot);
                ctx.set_item("cursor".to_string());
            }),
    )
    .slot(
        3,
        ItemBuilder::new()
            .key("label")
            .watch(target)
            .render_with(move |ctx| {
                let text = format!("target={}", ctx.get(target));
                ctx.set_item(text);
            }),
    )
    .slot(5, item("wall").key("wall"));
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();

    let err = frame.set_state(target, 5).unwrap_err();
    assert!(matches!(&err, Error::SlotCollision { key, slot: 5, .. } if key == "cursor"));
    assert!(!frame.states().has_pending());
    assert_eq!(
        shown(&frame, ALICE),
        [
            (0, "cursor".to_string()),
            (3, "target=5".to_string()),
            (5, "wall".to_string()),
        ]
    );
}

#[test]
fn externally_managed_items_skip_slot_bookkeeping() {
    let mut frame = Frame::new();
    let target = frame.state("target", 0_usize);

    let mut view = View::new(ViewConfig::rows(1));
    view.component(
        ItemBuilder::new()
            .key("ghost")
            .managed_externally()
            .render_with(|_| {}),
    )
    .component(
        ItemBuilder::new()
            .key("trail")
            .managed_externally()
            .watch(target)
            .render_with(move |ctx| {
                let slot = *ctx.get(target);
                ctx.set_slot(slot);
                ctx.set_item("trail".to_string());
            }),
    )
    .slot(5, item("wall").key("wall"));
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();

    let session = frame.session(ALICE).unwrap();
    let ghost = session.component("ghost").unwrap();
    assert!(ghost.is_managed_externally());
    assert_eq!(ghost.position(), None);
    assert_eq!(shown(&frame, ALICE), [(0, "trail".to_string()), (5, "wall".to_string())]);

    // The old slot is left to the handler, and occupied slots are not checked.
    frame.set_state(target, 3).unwrap();
    frame.set_state(target, 5).unwrap();
    assert_eq!(
        shown(&frame, ALICE),
        [
            (0, "trail".to_string()),
            (3, "trail".to_string()),
            (5, "trail".to_string()),
        ]
    );
    let session = frame.session(ALICE).unwrap();
    assert_eq!(session.component("trail").unwrap().position(), Some(5));
    assert_eq!(session.component_at(5).map(|c| c.key()), Some("trail"));
}

#[test]
fn hidden_paginations_switch_without_rendering() {
    let mut frame = Frame::new();
    let menu = frame.register(letters()).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();

    frame.hide(ALICE, "letters").unwrap();
    let page = frame.paginate(ALICE, "letters", PageSwitch::Next).unwrap();
    assert_eq!(page.page, 1);
    assert!(shown(&frame, ALICE).is_empty());

    frame.show(ALICE, "letters").unwrap();
    assert_eq!(
        shown(&frame, ALICE),
        [(0, "c".to_string()), (1, "d".to_string())]
    );
}

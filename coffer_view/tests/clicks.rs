// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The CLICK phase and user interceptors.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use coffer_view::{
    ClickKind, Error, Frame, ItemBuilder, MemoryContainer, Phase, Subject, View, ViewConfig,
};

use common::{ALICE, BOB, Counter, Tracked, at, item};

#[test]
fn clicks_cancel_by_default() {
    let mut frame = Frame::new();
    let mut view = View::new(ViewConfig::rows(1));
    view.slot(0, item("sword").key("sword"))
        .slot(1, item("shield").cancel_on_click(false));
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();

    let sword = frame.click(ALICE, 0, ClickKind::Left).unwrap();
    assert!(sword.cancelled);
    assert!(!sword.closed);
    assert_eq!(sword.component.as_deref(), Some("sword"));

    assert!(!frame.click(ALICE, 1, ClickKind::Left).unwrap().cancelled);

    let empty = frame.click(ALICE, 5, ClickKind::Left).unwrap();
    assert!(empty.cancelled);
    assert_eq!(empty.component, None);
}

#[test]
fn view_default_applies_to_empty_slots() {
    let mut frame = Frame::<String>::new();
    let view = View::new(ViewConfig::rows(1).cancel_on_click(false));
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();

    assert!(!frame.click(ALICE, 3, ClickKind::Right).unwrap().cancelled);
}

#[test]
fn click_handlers_see_slot_and_kind() {
    let mut frame = Frame::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut view = View::new(ViewConfig::rows(1));
    view.slot(6, {
        let seen = seen.clone();
        item("lever").on_click(move |ctx| {
            seen.borrow_mut().push((ctx.slot(), ctx.kind()));
            ctx.set_cancelled(false);
        })
    });
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();

    let outcome = frame.click(ALICE, 6, ClickKind::ShiftRight).unwrap();
    assert!(!outcome.cancelled);
    assert_eq!(*seen.borrow(), [(6, ClickKind::ShiftRight)]);
}

#[test]
fn close_on_click_closes_once_and_stops_the_phase() {
    let mut frame = Frame::new();
    let late = Counter::default();
    let mut view = View::new(ViewConfig::rows(1));
    view.slot(8, item("exit").key("exit").close_on_click(true))
        .slot(0, item("stay"));
    view.intercept(Phase::Click, {
        let late = late.clone();
        move |_, _| {
            late.bump();
            Ok(())
        }
    });
    let menu = frame.register(view).unwrap();

    let (container, closes) = Tracked::new(9);
    frame.open(menu, ALICE, container, ()).unwrap();
    let outcome = frame.click(ALICE, 8, ClickKind::Left).unwrap();
    assert!(outcome.closed);
    assert_eq!(outcome.component.as_deref(), Some("exit"));
    assert_eq!(closes.get(), 1);
    assert_eq!(late.get(), 0);
    assert!(!frame.is_open(ALICE));
    assert!(matches!(
        frame.click(ALICE, 8, ClickKind::Left),
        Err(Error::SessionNotOpen { .. })
    ));

    // A later click pass runs the whole chain again.
    frame.open(menu, BOB, MemoryContainer::new(9), ()).unwrap();
    frame.click(BOB, 0, ClickKind::Left).unwrap();
    assert_eq!(late.get(), 1);
    assert!(frame.is_open(BOB));
}

#[test]
fn handlers_can_request_close() {
    let mut frame = Frame::new();
    let mut view = View::new(ViewConfig::rows(1));
    view.slot(
        2,
        item("confirm").on_click(|ctx| {
            if ctx.kind() == ClickKind::Left {
                ctx.close();
            }
        }),
    );
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();

    assert!(!frame.click(ALICE, 2, ClickKind::Right).unwrap().closed);
    assert!(frame.is_open(ALICE));
    assert!(frame.click(ALICE, 2, ClickKind::Left).unwrap().closed);
    assert!(!frame.is_open(ALICE));
}

#[test]
fn update_on_click_re_renders_the_item() {
    let mut frame = Frame::new();
    let renders = Counter::default();
    let mut view = View::new(ViewConfig::rows(1));
    view.slot(4, {
        let renders = renders.clone();
        ItemBuilder::new()
            .update_on_click(true)
            .render_with(move |ctx| {
                renders.bump();
                ctx.set_item(format!("pressed {}", renders.get() - 1));
            })
    });
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();

    frame.click(ALICE, 4, ClickKind::Left).unwrap();
    frame.click(ALICE, 4, ClickKind::Left).unwrap();
    assert_eq!(renders.get(), 3);
    assert_eq!(at(&frame, ALICE, 4).as_deref(), Some("pressed 2"));
}

#[test]
fn interceptor_errors_abort_the_phase() {
    let mut frame = Frame::new();
    let after = Counter::default();
    let mut view = View::new(ViewConfig::rows(1));
    view.slot(0, item("trap"));
    view.intercept(Phase::Click, |_, subject| match subject {
        Subject::Click(ctx) if ctx.slot() == 0 => Err(Error::Interceptor("trapped".into())),
        _ => Ok(()),
    })
    .intercept(Phase::Click, {
        let after = after.clone();
        move |_, _| {
            after.bump();
            Ok(())
        }
    });
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();

    let err = frame.click(ALICE, 0, ClickKind::Left).unwrap_err();
    assert!(matches!(&err, Error::Interceptor(reason) if reason == "trapped"));
    assert_eq!(after.get(), 0);
    // The session survives and the container is writable again only
    // through the pipeline.
    assert!(frame.is_open(ALICE));
    assert!(!frame.session(ALICE).unwrap().container().is_active());

    frame.click(ALICE, 1, ClickKind::Left).unwrap();
    assert_eq!(after.get(), 1);
}

#[test]
fn finish_from_a_first_interceptor_suppresses_defaults_once() {
    let mut frame = Frame::new();
    let handled = Counter::default();
    let mut view = View::new(ViewConfig::rows(1).cancel_on_click(false));
    view.slot(0, {
        let handled = handled.clone();
        item("gem").on_click(move |_| handled.bump())
    });
    view.intercept_first(Phase::Click, |pipeline, subject| {
        if let Subject::Click(ctx) = subject
            && ctx.kind() == ClickKind::Middle
        {
            ctx.cancel();
            pipeline.finish();
        }
        Ok(())
    });
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();

    assert!(frame.click(ALICE, 0, ClickKind::Middle).unwrap().cancelled);
    assert_eq!(handled.get(), 0);

    frame.click(ALICE, 0, ClickKind::Left).unwrap();
    assert_eq!(handled.get(), 1);
}

#[test]
fn interceptors_see_every_phase() {
    let mut frame = Frame::new();
    let phases = Rc::new(RefCell::new(Vec::new()));
    let mut view = View::new(ViewConfig::rows(1));
    view.slot(0, item("book").key("book"));
    for phase in Phase::ALL {
        let phases = phases.clone();
        view.intercept(phase, move |_, subject| {
            let key = subject
                .component_id()
                .and_then(|id| subject.session().get(id))
                .map(|c| c.key().to_string());
            phases.borrow_mut().push((subject.phase(), key));
            Ok(())
        });
    }
    let menu = frame.register(view).unwrap();
    frame.open(menu, ALICE, MemoryContainer::new(9), ()).unwrap();
    frame.force_update(ALICE, "book").unwrap();
    frame.click(ALICE, 0, ClickKind::Left).unwrap();
    frame.close(ALICE).unwrap();

    let book = Some("book".to_string());
    assert_eq!(
        *phases.borrow(),
        [
            (Phase::Render, book.clone()),
            (Phase::Render, book.clone()),
            (Phase::Update, book.clone()),
            (Phase::Click, book.clone()),
            (Phase::Clear, book),
        ]
    );
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Callbacks and fallible signals.
//!
//! A push button has one `clicked` action (a `Callback`) and a fallible
//! `validate` signal whose first failing listener stops the click.
//!
//! Run:
//! - `RUST_LOG=trace cargo run -p understory_demos --example button_callbacks`

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use kurbo::{Point, Rect};
use understory_signal::{Callback, DispatchError, Signal};

#[derive(Debug)]
enum ClickError {
    Outside(Point),
    Rejected(&'static str),
    Dispatch(DispatchError),
}

impl fmt::Display for ClickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outside(at) => write!(f, "click at {at:?} is outside the button"),
            Self::Rejected(why) => write!(f, "click rejected: {why}"),
            Self::Dispatch(err) => write!(f, "dispatch failed: {err}"),
        }
    }
}

fn report(result: Result<(), ClickError>) {
    match result {
        Ok(()) => println!("  -> ok"),
        Err(err) => println!("  -> {err}"),
    }
}

struct PushButton {
    bounds: Rect,
    validate: Signal<Point, ClickError>,
    clicked: Callback<Point>,
}

impl PushButton {
    fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            validate: Signal::new(),
            clicked: Callback::new(),
        }
    }

    fn click(&self, at: Point) -> Result<(), ClickError> {
        if !self.bounds.contains(at) {
            return Err(ClickError::Outside(at));
        }
        self.validate.emit(at)?;
        match self.clicked.invoke(at) {
            Ok(()) => Ok(()),
            Err(DispatchError::NullCallback) => {
                log::warn!("button clicked with no action set");
                Ok(())
            }
            Err(err) => Err(ClickError::Dispatch(err)),
        }
    }
}

struct Counter {
    clicks: Cell<u32>,
}

impl Counter {
    fn bump(&self, at: Point) {
        self.clicks.set(self.clicks.get() + 1);
        println!("  counter: click #{} at {at:?}", self.clicks.get());
    }
}

fn main() {
    env_logger::init();

    let button = PushButton::new(Rect::new(0.0, 0.0, 100.0, 30.0));

    println!("click with no action");
    report(button.click(Point::new(10.0, 10.0)));

    let counter = Rc::new(Counter {
        clicks: Cell::new(0),
    });
    button.clicked.set_method(&counter, Counter::bump);

    let locked = Rc::new(Cell::new(false));
    let l = locked.clone();
    let _lock = button.validate.connect(move |_| {
        if l.get() {
            Err(ClickError::Rejected("locked"))
        } else {
            Ok(())
        }
    });
    let _trace = button
        .validate
        .connect(|at| println!("  validate: {at:?}"));

    println!("click inside");
    report(button.click(Point::new(50.0, 15.0)));
    println!("click outside");
    report(button.click(Point::new(150.0, 15.0)));

    println!("lock and click");
    locked.set(true);
    report(button.click(Point::new(50.0, 15.0)));
    locked.set(false);

    println!("replace the action");
    button
        .clicked
        .set_with(String::from("ok"), |at, label: &String| {
            println!("  action {label:?} at {at:?}");
        });
    report(button.click(Point::new(20.0, 20.0)));
    println!("counter total: {}", counter.clicks.get());
}

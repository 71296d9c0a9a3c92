// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Signal basics.
//!
//! A window exposes `resized` and `closed` signals. A layout object and a
//! status bar listen to them; the status bar is bound by method and goes away
//! halfway through, and the layout's slots are kept in a container.
//!
//! Run:
//! - `RUST_LOG=trace cargo run -p understory_demos --example signal_basics`

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kurbo::{Point, Rect, Size};
use understory_signal::{Signal, SlotContainer};

struct Window {
    size: Cell<Size>,
    resized: Signal<Size>,
    closed: Signal<()>,
}

impl Window {
    fn new(size: Size) -> Self {
        Self {
            size: Cell::new(size),
            resized: Signal::new(),
            closed: Signal::new(),
        }
    }

    fn resize(&self, size: Size) {
        if self.size.replace(size) != size {
            self.resized.notify(size);
        }
    }

    fn close(&self) {
        self.closed.notify(());
    }
}

struct StatusBar {
    text: RefCell<String>,
}

impl StatusBar {
    fn on_resized(&self, size: Size) {
        *self.text.borrow_mut() = format!("{} x {}", size.width, size.height);
        println!("  status: {}", self.text.borrow());
    }
}

fn main() {
    env_logger::init();

    let window = Window::new(Size::new(800.0, 600.0));
    let content = Rc::new(Cell::new(Rect::ZERO));

    let mut layout_slots = SlotContainer::new();
    let c = content.clone();
    layout_slots.push(window.resized.connect(move |size| {
        // 8px margin on every side.
        let rect = Rect::from_origin_size(Point::ORIGIN, size).inset(-8.0);
        c.set(rect);
        println!("  layout: content area {:.0}", rect.area());
    }));
    layout_slots.push(window.closed.connect(|()| println!("  layout: torn down")));

    let status = Rc::new(StatusBar {
        text: RefCell::new(String::new()),
    });
    let status_slot = window
        .resized
        .connect_method(&status, StatusBar::on_resized);

    println!("resize to 1024x768");
    window.resize(Size::new(1024.0, 768.0));

    println!("resize to the same size (no emission)");
    window.resize(Size::new(1024.0, 768.0));

    println!("disable the status bar, resize to 640x480");
    status_slot.disable();
    window.resize(Size::new(640.0, 480.0));
    status_slot.enable();

    println!("drop the status bar, resize to 320x240");
    drop(status);
    log::info!("status slot valid after owner drop: {}", status_slot.is_valid());
    window.resize(Size::new(320.0, 240.0));

    println!("close");
    window.close();

    println!("tear down layout, resize to 100x100");
    layout_slots.clear();
    window.resize(Size::new(100.0, 100.0));

    println!(
        "last content rect: {:?}, live resized handlers: {}",
        content.get(),
        window.resized.live_count()
    );
}

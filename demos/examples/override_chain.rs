// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Override chains.
//!
//! A widget's message handler and its preferred-size query are
//! `VirtualFunction`s. A default implementation is connected first; later
//! connections act like subclass overrides that can consult or skip the
//! older behaviour through `Super`.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_demos --example override_chain`

use std::cell::Cell;
use std::rc::Rc;

use kurbo::Size;
use understory_signal::{DispatchError, Super, VirtualFunction};

#[derive(Copy, Clone, Debug)]
enum Message {
    Press,
    Release,
    Key(char),
}

struct Widget {
    process: VirtualFunction<Message, bool>,
    preferred_size: VirtualFunction<(), Size>,
}

/// A button-like override: tracks the pressed state, then lets the default
/// handler see the message too.
struct Pressable {
    pressed: Cell<bool>,
}

impl Pressable {
    fn process(
        &self,
        msg: Message,
        base: Super<'_, Message, bool>,
    ) -> Result<bool, DispatchError> {
        match msg {
            Message::Press => self.pressed.set(true),
            Message::Release => self.pressed.set(false),
            Message::Key(_) => {}
        }
        base.invoke(msg)
    }
}

fn main() {
    env_logger::init();

    let widget = Widget {
        process: VirtualFunction::new(),
        preferred_size: VirtualFunction::new(),
    };

    let _default_process = widget.process.connect(|msg, _| {
        println!("  default: {msg:?}");
        Ok(matches!(msg, Message::Press | Message::Release))
    });
    let _default_size = widget
        .preferred_size
        .connect(|(), _| Ok(Size::new(80.0, 24.0)));

    let pressable = Rc::new(Pressable {
        pressed: Cell::new(false),
    });
    let _pressable = widget
        .process
        .connect_method(&pressable, Pressable::process);

    // Keyboard filter: swallows digits, forwards everything else.
    let _filter = widget.process.connect(|msg, base| match msg {
        Message::Key(c) if c.is_ascii_digit() => {
            println!("  filter: swallowed {c:?}");
            Ok(true)
        }
        _ => base.invoke(msg),
    });

    // Padding override: asks the base size and grows it.
    let padding = widget
        .preferred_size
        .connect_with(6.0_f64, |(), pad, base| {
            let inner = base.invoke(())?;
            Ok(Size::new(inner.width + 2.0 * pad, inner.height + 2.0 * pad))
        });

    for msg in [Message::Press, Message::Key('7'), Message::Key('q'), Message::Release] {
        println!("process {msg:?}");
        match widget.process.invoke(msg) {
            Ok(handled) => {
                println!("  handled: {handled}, pressed: {}", pressable.pressed.get());
            }
            Err(err) => println!("  error: {err}"),
        }
    }

    println!("preferred size: {:?}", widget.preferred_size.invoke(()));
    padding.disable();
    println!("without padding: {:?}", widget.preferred_size.invoke(()));

    // An override that always delegates fails cleanly at the bottom of a
    // chain with no default implementation.
    let bare: VirtualFunction<(), Size> = VirtualFunction::new();
    let _passthrough = bare.connect(|(), base| base.invoke(()));
    println!("bare chain: {:?}", bare.invoke(()));
}

//! Programs shared by the integration tests.

use actorlab::actor::{ActorKindBuilder, Program, StateBuilder};
use actorlab::{ActorId, Ctx, Event, EventKind, HandlerError};

pub const START: EventKind = EventKind::new("start");
pub const E1: EventKind = EventKind::new("e1");
pub const GO: EventKind = EventKind::new("go");
pub const SET: EventKind = EventKind::new("set");
pub const USE: EventKind = EventKind::new("use");
pub const TICK: EventKind = EventKind::new("tick");
pub const REQUEST: EventKind = EventKind::new("request");
pub const REPLY: EventKind = EventKind::new("reply");

fn peer(ctx: &Ctx<'_>) -> Result<ActorId, HandlerError> {
    ctx.payload::<ActorId>()
        .copied()
        .ok_or_else(|| HandlerError::Failure("event carries no peer id".to_string()))
}

/// `A` sends `E1` to `B` and halts; `B` moves to `Done`, whose entry
/// action asserts `true`.
pub fn handoff_program() -> Program {
    let a = ActorKindBuilder::<()>::new("A")
        .state(StateBuilder::new("Init").start().on_event_do(START, |_, ctx| {
            let b = peer(ctx)?;
            ctx.send(b, E1);
            ctx.halt()
        }))
        .build()
        .expect("kind A");
    let b = ActorKindBuilder::<()>::new("B")
        .state(StateBuilder::new("Waiting").start().on_event_goto(E1, "Done"))
        .state(
            StateBuilder::new("Done").on_entry(|_, ctx| ctx.assert(true, "reached Done")),
        )
        .build()
        .expect("kind B");
    Program::builder()
        .kind(a)
        .kind(b)
        .entry(|setup| {
            let a = setup.create("A")?;
            let b = setup.create("B")?;
            setup.send(a, Event::new(START).with_payload(b));
            Ok(())
        })
        .build()
        .expect("handoff program")
}

/// An actor that only knows `SET`, sent `X`.
pub fn unhandled_program() -> Program {
    const X: EventKind = EventKind::new("x");
    let kind = ActorKindBuilder::<()>::new("Strict")
        .state(StateBuilder::new("Ready").start().on_event_do(SET, |_, _| Ok(())))
        .build()
        .expect("kind");
    Program::builder()
        .kind(kind)
        .entry(|setup| {
            let strict = setup.create("Strict")?;
            setup.send(strict, X);
            Ok(())
        })
        .build()
        .expect("unhandled program")
}

/// `Client` creates `Server` from its start state's entry action; both then
/// wait for input that never comes.
pub fn stalled_program() -> Program {
    let client = ActorKindBuilder::<Option<ActorId>>::new("Client")
        .state(
            StateBuilder::new("Connecting")
                .start()
                .on_entry(|server: &mut Option<ActorId>, ctx| {
                    *server = Some(ctx.create("Server")?);
                    Ok(())
                })
                .on_event_do(REPLY, |_, ctx| ctx.halt()),
        )
        .build()
        .expect("client");
    let server = ActorKindBuilder::<()>::new("Server")
        .state(StateBuilder::new("Listening").start().on_event_do(REQUEST, |_, ctx| {
            let client = peer(ctx)?;
            ctx.send(client, REPLY);
            Ok(())
        }))
        .build()
        .expect("server");
    Program::builder()
        .kind(client)
        .kind(server)
        .entry(|setup| {
            setup.create("Client")?;
            Ok(())
        })
        .build()
        .expect("stalled program")
}

#[derive(Debug, Default)]
struct Resource {
    ready: bool,
}

/// `Setter` and `User` each message the `Server`; `User`'s message is only
/// valid after `Setter`'s. With `fixed`, the server defers `USE` until it
/// has seen `SET`.
pub fn race_program(fixed: bool) -> Program {
    let server = if fixed {
        ActorKindBuilder::<Resource>::new("Server")
            .state(
                StateBuilder::new("NotReady")
                    .start()
                    .defer(USE)
                    .on_event_goto(SET, "Ready"),
            )
            .state(StateBuilder::new("Ready").on_event_do(USE, |_, ctx| ctx.halt()))
            .build()
            .expect("server")
    } else {
        ActorKindBuilder::<Resource>::new("Server")
            .state(
                StateBuilder::new("Serving")
                    .start()
                    .on_event_do(SET, |res: &mut Resource, _| {
                        res.ready = true;
                        Ok(())
                    })
                    .on_event_do(USE, |res: &mut Resource, ctx| {
                        ctx.assert(res.ready, "resource used before it was set")?;
                        ctx.halt()
                    }),
            )
            .build()
            .expect("server")
    };
    let forwarder = |name: &'static str, event: EventKind| {
        ActorKindBuilder::<()>::new(name)
            .state(StateBuilder::new("Idle").start().on_event_do(GO, move |_, ctx| {
                let server = peer(ctx)?;
                ctx.send(server, event);
                ctx.halt()
            }))
            .build()
            .expect("forwarder")
    };
    Program::builder()
        .kind(server)
        .kind(forwarder("Setter", SET))
        .kind(forwarder("User", USE))
        .entry(|setup| {
            let server = setup.create("Server")?;
            let setter = setup.create("Setter")?;
            let user = setup.create("User")?;
            setup.send(setter, Event::new(GO).with_payload(server));
            setup.send(user, Event::new(GO).with_payload(server));
            Ok(())
        })
        .build()
        .expect("race program")
}

/// One actor whose start state draws one `random_int` per entry of `widths`.
pub fn choice_program(widths: Vec<u64>) -> Program {
    let kind = ActorKindBuilder::<Vec<u64>>::new("Chooser")
        .state(
            StateBuilder::new("Choosing")
                .start()
                .on_entry(move |picked: &mut Vec<u64>, ctx| {
                    for &width in &widths {
                        picked.push(ctx.random_int(width)?);
                    }
                    Ok(())
                }),
        )
        .build()
        .expect("chooser");
    Program::builder()
        .kind(kind)
        .entry(|setup| {
            setup.create("Chooser")?;
            Ok(())
        })
        .build()
        .expect("choice program")
}

/// `actors` independent actors, each with `events` queued ticks that it ignores.
pub fn interleaving_program(actors: usize, events: usize) -> Program {
    let kind = ActorKindBuilder::<()>::new("Ticker")
        .state(StateBuilder::new("Ticking").start().ignore(TICK))
        .build()
        .expect("ticker");
    Program::builder()
        .kind(kind)
        .entry(move |setup| {
            for _ in 0..actors {
                let ticker = setup.create("Ticker")?;
                for _ in 0..events {
                    setup.send(ticker, TICK);
                }
            }
            Ok(())
        })
        .build()
        .expect("interleaving program")
}

/// `senders` actors each send `count` numbered events to one sink, which
/// halts once it has seen all of them.
pub fn fan_in_program(senders: usize, count: usize) -> Program {
    let total = senders * count;
    let sink = ActorKindBuilder::<Vec<(u64, u64)>>::new("Sink")
        .state(StateBuilder::new("Collecting").start().on_event_do(
            TICK,
            move |seen: &mut Vec<(u64, u64)>, ctx| {
                let (from, seq) = ctx
                    .payload::<(u64, u64)>()
                    .copied()
                    .ok_or_else(|| HandlerError::Failure("tick without sequence".to_string()))?;
                if let Some(&(_, last)) = seen.iter().rev().find(|(sender, _)| *sender == from) {
                    ctx.assert(last < seq, "events from one sender reordered")?;
                }
                seen.push((from, seq));
                if seen.len() == total {
                    return ctx.halt();
                }
                Ok(())
            },
        ))
        .build()
        .expect("sink");
    let sender = ActorKindBuilder::<()>::new("Sender")
        .state(StateBuilder::new("Sending").start().on_event_do(START, move |_, ctx| {
            let sink = peer(ctx)?;
            let me = ctx.id().as_u64();
            for seq in 0..count as u64 {
                ctx.send(sink, Event::new(TICK).with_payload((me, seq)));
            }
            ctx.halt()
        }))
        .build()
        .expect("sender");
    Program::builder()
        .kind(sink)
        .kind(sender)
        .entry(move |setup| {
            let sink = setup.create("Sink")?;
            for _ in 0..senders {
                let sender = setup.create("Sender")?;
                setup.send(sender, Event::new(START).with_payload(sink));
            }
            Ok(())
        })
        .build()
        .expect("fan-in program")
}

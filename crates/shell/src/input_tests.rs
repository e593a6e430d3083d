// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn read_all(input: &mut dyn Input) -> Result<String, LexError> {
    let mut s = String::new();
    while let Some(c) = input.next_char()? {
        s.push(c);
    }
    Ok(s)
}

#[test]
fn text_input_yields_every_char() {
    let mut input = TextInput::new("echo ←\n");
    assert_eq!(read_all(&mut input).unwrap(), "echo ←\n");
    assert_eq!(input.next_char().unwrap(), None);
}

#[test]
fn chan_input_joins_split_utf8() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let chan = Chan::new();
    let arrow = "←".as_bytes();
    rt.block_on(async {
        chan.send(Msg::Bytes(b"a".to_vec())).await;
        chan.send(Msg::Bytes(arrow[..1].to_vec())).await;
        chan.send(Msg::Bytes(arrow[1..].to_vec())).await;
        chan.send(Msg::Bytes(b"b\n".to_vec())).await;
        chan.close(None);
    });
    let ctx = Ctx::builder().build();
    let mut input = ChanInput::new(ctx, chan, rt.handle().clone());
    assert_eq!(read_all(&mut input).unwrap(), "a←b\n");
}

#[test]
fn chan_input_reports_close_cause() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let chan = Chan::new();
    chan.close(Some(Error::Io("stdin: gone".into())));
    let ctx = Ctx::builder().build();
    let mut input = ChanInput::new(ctx, chan, rt.handle().clone());
    assert_eq!(
        input.next_char(),
        Err(LexError::Input(Error::Io("stdin: gone".into())))
    );
}

#[test]
fn interrupt_while_waiting_is_reported() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ctx = Ctx::builder().build();
    ctx.post(ql_core::Signal::Intr);
    let mut input = ChanInput::new(ctx, Chan::new(), rt.handle().clone());
    assert_eq!(input.next_char(), Err(LexError::Interrupted));
}

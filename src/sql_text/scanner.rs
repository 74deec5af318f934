#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    // SQL Server style [bracketed identifier]
    Bracketed,
    LineComment,
    BlockComment(u32),
}

/// Advance `state` over the byte at `idx`; returns how many extra bytes were consumed.
pub(super) fn step(state: &mut State, bytes: &[u8], idx: usize) -> usize {
    let b = bytes[idx];
    match *state {
        State::Normal => match b {
            b'\'' => *state = State::SingleQuoted,
            b'"' => *state = State::DoubleQuoted,
            b'[' => *state = State::Bracketed,
            _ if super::parsers::is_line_comment_start(bytes, idx) => {
                *state = State::LineComment;
                return 1;
            }
            _ if super::parsers::is_block_comment_start(bytes, idx) => {
                *state = State::BlockComment(1);
                return 1;
            }
            _ => {}
        },
        State::SingleQuoted => {
            if b == b'\'' {
                if bytes.get(idx + 1) == Some(&b'\'') {
                    return 1; // escaped quote
                }
                *state = State::Normal;
            }
        }
        State::DoubleQuoted => {
            if b == b'"' {
                if bytes.get(idx + 1) == Some(&b'"') {
                    return 1;
                }
                *state = State::Normal;
            }
        }
        State::Bracketed => {
            if b == b']' {
                *state = State::Normal;
            }
        }
        State::LineComment => {
            if b == b'\n' {
                *state = State::Normal;
            }
        }
        State::BlockComment(depth) => {
            if super::parsers::is_block_comment_start(bytes, idx) {
                *state = State::BlockComment(depth + 1);
                return 1;
            } else if super::parsers::is_block_comment_end(bytes, idx) {
                *state = if depth == 1 {
                    State::Normal
                } else {
                    State::BlockComment(depth - 1)
                };
                return 1;
            }
        }
    }
    0
}

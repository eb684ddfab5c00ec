//! Macro reference expansion.

use crate::error::ErrorKind;
use crate::vars::Vars;

/// References nested deeper than this many substitution layers are assumed to be
/// self-referential.
const MAX_DEPTH: usize = 64;

/// Represents a frame on the stack inside the `expand` function. This is used for tracking the
/// previous buffer when expanding potentially nested expressions (i.e., either `$()` or `${}`).
/// Single variable expansions (e.g., `$X`) are handled inline without creating a frame since they
/// cannot possibly have nested expressions.
struct Frame {
    previous_buffer: String,
    /// Track which character opened this stack frame (should be parenthesis or brace).
    opening_delimiter: char,
}

/// The primary public interface for running variable expansion on an input string, given a
/// collection of `vars`.
///
/// The goal here is to be `O(n)` over the input. This works by iterating over the input string
/// and storing plain characters into a buffer until we hit either:
///  1. A simple variable expansion (e.g., `$X`), where we just evaluate it against `vars` inline
///     since there could not possibly be any nesting.
///  2. A long variable expansion (e.g., `$(` or `${`), where there could be nested expressions,
///     where we push the current buffer onto a stack, and then continue parsing. When we hit a
///     matching closing delimiter (tracked on the stack frame), we evaluate the buffer, pop the
///     previous buffer off the stack, join it with the evaluated value, and keep going.
///
/// `$$` yields a literal `$`, and undefined macros expand to the empty string. Substituted values
/// are themselves expanded, so chains like `A = $(B)` resolve to a fixed point; the depth guard
/// turns self-reference into `RecursiveMacro`.
pub fn expand(s: &str, vars: &Vars) -> Result<String, ErrorKind> {
    expand_at(s, vars, 0)
}

fn expand_at(s: &str, vars: &Vars, depth: usize) -> Result<String, ErrorKind> {
    if depth > MAX_DEPTH {
        return Err(ErrorKind::RecursiveMacro(s.to_string()));
    }

    let mut stack: Vec<Frame> = vec![];
    let mut current_buffer: String = String::with_capacity(s.len());
    let mut hit_variable: bool = false;

    for c in s.chars() {
        match c {
            '$' => {
                hit_variable = !hit_variable;

                // Push a literal `$` if it's the second one (`hit_variable` is `false`).
                if !hit_variable {
                    current_buffer.push(c);
                }
            }
            '(' | '{' => {
                // If we haven't hit a variable, consider this a normal char.
                if !hit_variable {
                    current_buffer.push(c);
                    continue;
                }

                // Otherwise, push a frame onto the stack to begin processing this expression.
                stack.push(Frame {
                    previous_buffer: current_buffer,
                    opening_delimiter: c,
                });
                current_buffer = String::new();
                hit_variable = false;
            }
            ')' | '}' => {
                match stack.last() {
                    None => current_buffer.push(c),
                    Some(frame) => {
                        // Test if this character matches the opening delimiter.
                        if (c == '}' && frame.opening_delimiter == '{')
                            || (c == ')' && frame.opening_delimiter == '(')
                        {
                            // Expression terminated; the buffer now holds the resolved macro
                            // name, so substitute and keep expanding the substituted value.
                            let value =
                                expand_at(&vars.get(&current_buffer).value, vars, depth + 1)?;

                            // This `unwrap()` is safe because we checked that the stack contains
                            // a `last()` element, so it cannot be empty.
                            current_buffer = stack.pop().unwrap().previous_buffer;
                            current_buffer.push_str(&value);
                            hit_variable = false;
                            continue;
                        }

                        // Not the right trailing delimiter, so consider it just a char.
                        current_buffer.push(c)
                    }
                }
            }
            _ => {
                // If we hit the variable indicator, then inline expansion since nesting is
                // impossible.
                if hit_variable {
                    let value = expand_at(&vars.get(c.to_string()).value, vars, depth + 1)?;
                    current_buffer.push_str(&value);
                    hit_variable = false;
                    continue;
                }

                // Otherwise, just push the char.
                current_buffer.push(c);
            }
        }
    }

    // Return current buffer if the stack is empty, else an error.
    match stack.pop() {
        None => Ok(current_buffer),
        Some(_) => Err(ErrorKind::UnterminatedReference(s.to_string())),
    }
}

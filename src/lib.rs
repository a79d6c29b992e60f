//! symtab - Concurrent Symbol Interning
//!
//! This crate interns byte-string names into unique, immutable,
//! process-lifetime symbols, so that identity comparison of names is a
//! pointer comparison rather than a string comparison, and equal names
//! anywhere in a running program resolve to exactly one shared node. It is
//! the foundation a language runtime routes identifiers, operators, and
//! generated temporaries through.
//!
//! # Architecture
//!
//! ```text
//! intern(name)
//!    │
//!    ▼
//! ┌─────────┐    ┌───────────────────────────────┐
//! │ Hasher  │───▶│ Intern Tree                    │
//! │ content │    │  lock-free search (Acquire)    │──▶ hit: Sym
//! │ + mix   │    │  miss: single mutex, re-probe  │
//! └─────────┘    │  from the located slot,        │
//!                │  publish (Release)             │──▶ new Sym
//!                └──────────────┬────────────────┘
//!                               │ allocate
//!                               ▼
//!                ┌───────────────────────────────┐
//!                │ PermArena: immortal, aligned,  │
//!                │ zeroed blocks; never freed     │
//!                └───────────────────────────────┘
//! ```
//!
//! # Concurrency Contract
//!
//! - `lookup` and the fast path of `intern` never block and never take a
//!   lock: child slots are read with acquire ordering and published with
//!   release ordering, so a reader sees a fully-formed node or nothing.
//! - All insertions serialize on one mutex per table, held only across the
//!   re-validation probe, one allocation, and the publish store.
//! - No two threads can ever hold two different symbols for the same name.
//!
//! # Memory Model
//!
//! Symbol storage is permanent by design: the arena never frees, so a
//! [`Sym`] handle is `Copy`, `'static`, and always valid. Symbols are few
//! relative to a program's lifetime, and identity comparison forever is the
//! point of the exercise.
//!
//! # Examples
//!
//! ```
//! use symtab::SymbolTable;
//!
//! let table = SymbolTable::new();
//! let a = table.intern(b"hello")?;
//! let b = table.intern(b"hello")?;
//! assert_eq!(a, b);                       // one node per name
//! assert_eq!(a.name(), b"hello");
//!
//! let tmp = table.fresh();                // "##0", "##1", ...
//! assert!(tmp.name().starts_with(b"##"));
//! # Ok::<(), symtab::InternError>(())
//! ```
//!
//! The process-wide default table is available through the [`Sym`]
//! shorthand constructors:
//!
//! ```
//! use symtab::Sym;
//!
//! let s = Sym::intern("main")?;
//! assert_eq!(Sym::intern("main")?, s);
//! # Ok::<(), symtab::InternError>(())
//! ```

pub mod arena;
pub mod error;
pub mod hash;
pub mod symbol;
pub mod table;

mod tree;

pub use error::{InternError, Result};
pub use symbol::{Sym, MAX_NAME_LEN};
pub use table::{SymIter, SymbolTable, TableStats, SYMTAB};

//! Type-erased trigger arguments.
//!
//! Arguments travel with a fired trigger through guards, selectors, actions
//! and the unhandled-trigger handler. They are an ordered list of values of
//! arbitrary type, cheap to clone, and read back by position with
//! [`Args::get`].

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

type ArgValue = Arc<dyn Any + Send + Sync>;

/// Ordered, type-erased argument list passed along with a trigger.
///
/// # Example
///
/// ```rust
/// use stately::core::Args;
///
/// let args = Args::from((3u32, "volume"));
/// assert_eq!(args.len(), 2);
/// assert_eq!(args.get::<u32>(0), Some(&3));
/// assert_eq!(args.get::<&str>(1), Some(&"volume"));
/// assert_eq!(args.get::<String>(1), None);
/// ```
#[derive(Clone, Default)]
pub struct Args {
    values: Arc<Vec<ArgValue>>,
}

impl Args {
    /// An empty argument list.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append a value.
    pub fn with<V: Any + Send + Sync>(mut self, value: V) -> Self {
        Arc::make_mut(&mut self.values).push(Arc::new(value));
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`, if present and of type `V`.
    pub fn get<V: Any>(&self, index: usize) -> Option<&V> {
        self.values.get(index)?.downcast_ref::<V>()
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args").field("len", &self.len()).finish()
    }
}

impl From<()> for Args {
    fn from(_: ()) -> Self {
        Args::empty()
    }
}

/// Descriptive parameter metadata for a trigger.
///
/// Implemented for `()` and tuples up to arity four. The names are only
/// reported through reflection; fired arguments are never checked against
/// them.
pub trait ParameterTypes {
    fn type_names() -> Vec<&'static str>;
}

impl ParameterTypes for () {
    fn type_names() -> Vec<&'static str> {
        Vec::new()
    }
}

macro_rules! tuple_args {
    ($($name:ident: $value:ident),+) => {
        impl<$($name: Any + Send + Sync),+> From<($($name,)+)> for Args {
            fn from(($($value,)+): ($($name,)+)) -> Self {
                Args::empty()$(.with($value))+
            }
        }

        impl<$($name: 'static),+> ParameterTypes for ($($name,)+) {
            fn type_names() -> Vec<&'static str> {
                vec![$(type_name::<$name>()),+]
            }
        }
    };
}

tuple_args!(A: a);
tuple_args!(A: a, B: b);
tuple_args!(A: a, B: b, C: c);
tuple_args!(A: a, B: b, C: c, D: d);

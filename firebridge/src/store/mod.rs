pub mod firestore;
pub mod memory;
pub mod traits;
pub mod value;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use traits::DocumentStore;

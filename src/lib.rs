pub mod core;
pub mod alphabet;
pub mod sequence;
pub mod index;
pub mod query;
pub mod storage;
pub mod compression;
pub mod parallel;
pub mod search;

pub use crate::core::config::{Config, ImportFailurePolicy};
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::tree::ProteinTree;

/*
┌────────────────────────────────────────────────────────────────────────────────────────────┐
│                            PROTREE STRUCT ARCHITECTURE                                      │
└────────────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────────── CORE LAYER ──────────────────────────────────────────┐
│                                                                                              │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                             struct ProteinTree                                      │    │
│  │  ┌──────────────────────────────────────────────────────────────────────────────┐ │    │
│  │  │ config: Config                        // Tree shape, caches, import         │ │    │
│  │  │ store: Arc<dyn ComponentStore>        // Persisted nodes and metadata       │ │    │
│  │  │ provider: Arc<dyn SequenceProvider>   // Protein sequences                  │ │    │
│  │  │ residues: Arc<dyn ResidueTable>       // Alphabet and ambiguity codes       │ │    │
│  │  │ tags: TagSet                          // Tags present in the database       │ │    │
│  │  │ node_cache: NodeCache                 // Occurrence-budgeted node cache     │ │    │
│  │  │ query_cache: QueryCache               // Fast/slow result caches            │ │    │
│  │  │ // Metrics                                                                   │ │    │
│  │  │ start_time: Instant                                                         │ │    │
│  │  │ query_count: AtomicU64                                                      │ │    │
│  │  └──────────────────────────────────────────────────────────────────────────────┘ │    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
│                                                                                              │
│  ┌──────────────────┐  ┌──────────────────────┐  ┌───────────────────────────────────┐    │
│  │ struct Config    │  │ type PeptideMapping  │  │ struct TreeStats                  │    │
│  │ • initial_tag_   │  │ sequence ->          │  │ • uptime_secs                     │    │
│  │   size           │  │   accession ->       │  │ • tag_count                       │    │
│  │ • max_node_size  │  │     Vec<Position>    │  │ • node_cache: NodeCacheStats      │    │
│  │ • memory_alloc.  │  └──────────────────────┘  │ • fast_cache / slow_cache         │    │
│  └──────────────────┘                            └───────────────────────────────────┘    │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────── INDEX LAYER ────────────────────────────────────────────┐
│                                                                                              │
│  ┌──────────────────────────────┐   ┌─────────────────────────────────────────────────┐    │
│  │ struct Node                  │   │ enum NodeContent                                │    │
│  │ • depth: usize               │   │ • Leaf(ProteinMapping)                          │    │
│  │ • size: usize                │   │ • Branch { subtree: BTreeMap<char, Node>,       │    │
│  │ • content: NodeContent       │   │            termini: ProteinMapping }            │    │
│  └──────────────────────────────┘   └─────────────────────────────────────────────────┘    │
│                                                                                              │
│  ┌──────────────────────────────┐   ┌─────────────────────────────────────────────────┐    │
│  │ struct TagSpace              │   │ struct TagSet                                   │    │
│  │ • alphabet: Vec<char>        │   │ • space: TagSpace                               │    │
│  │ • tag_size: usize            │   │ • ordinals: RoaringBitmap                       │    │
│  └──────────────────────────────┘   └─────────────────────────────────────────────────┘    │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────── STORAGE LAYER ──────────────────────────────────────────┐
│                                                                                              │
│  trait ComponentStore ──impl──> FileStore   (nodes/<c>/<tag>.node, meta/manifest.json)      │
│                       └─impl──> MemoryStore                                                  │
│                                                                                              │
│  FileStore ──uses──> StorageLayout, FileLock, frame (crc32 + length), CompressedBlock       │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────── RELATIONSHIPS ──────────────────────────────────────────┐
│                                                                                              │
│  ProteinTree ──open──> Importer ──stage A──> scan workers ──fill──> passage directory       │
│     │                     └──stage B──> rayon pool ──split + save_node──> ComponentStore    │
│     │                                                                                       │
│     ├──protein_mapping──> initial_tags ──> NodeCache ──> Node::match_peptide               │
│     │                          │                                                            │
│     │                          └──uses──> ResidueMatcher (MatchingPolicy)                  │
│     │                                                                                       │
│     ├──owns──> QueryCache ──stores──> Arc<PeptideMapping>                                  │
│     │                                                                                       │
│     └──peptide_iterator──> PeptideIterator ──walks──> TagSet + Node subtrees               │
│                                                                                              │
└──────────────────────────────────────────────────────────────────────────────────────────────┘
*/

//! class_id — predefined class ids of the supported VM build.
//!
//! Нумерация фиксирована сборкой VM (порядок списков классов в VM). Значения выше
//! `NUM_PREDEFINED` — пользовательские классы, от `TOP_LEVEL_CID_OFFSET` — top-level.

use serde::Serialize;
use std::fmt;

use crate::consts::TOP_LEVEL_CID_OFFSET;

/// Class id as read from the stream (any `i32`, not only predefined ones).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ClassId(pub i32);

// Internal VM classes: [CLASS ..= UNWIND_ERROR].
const INTERNAL: &[&str] = &[
    "Class",
    "PatchClass",
    "Function",
    "ClosureData",
    "FfiTrampolineData",
    "Field",
    "Script",
    "Library",
    "Namespace",
    "KernelProgramInfo",
    "Code",
    "Instructions",
    "InstructionsSection",
    "ObjectPool",
    "PcDescriptors",
    "CodeSourceMap",
    "CompressedStackMaps",
    "LocalVarDescriptors",
    "ExceptionHandlers",
    "Context",
    "ContextScope",
    "ParameterTypeCheck",
    "SingleTargetCache",
    "UnlinkedCall",
    "MonomorphicSmiableCall",
    "CallSiteData",
    "ICData",
    "MegamorphicCache",
    "SubtypeTestCache",
    "LoadingUnit",
    "Error",
    "ApiError",
    "LanguageError",
    "UnhandledException",
    "UnwindError",
];

// Instance classes: [INSTANCE ..= TRANSFERABLE_TYPED_DATA].
const INSTANCES: &[&str] = &[
    "Instance",
    "LibraryPrefix",
    "TypeArguments",
    "AbstractType",
    "Type",
    "FunctionType",
    "TypeRef",
    "TypeParameter",
    "Closure",
    "Number",
    "Integer",
    "Smi",
    "Mint",
    "Double",
    "Bool",
    "GrowableObjectArray",
    "Float32x4",
    "Int32x4",
    "Float64x2",
    "TypedDataBase",
    "TypedData",
    "ExternalTypedData",
    "TypedDataView",
    "Pointer",
    "DynamicLibrary",
    "Capability",
    "ReceivePort",
    "SendPort",
    "StackTrace",
    "RegExp",
    "WeakProperty",
    "MirrorReference",
    "LinkedHashMap",
    "FutureOr",
    "UserTag",
    "TransferableTypedData",
    // arrays
    "Array",
    "ImmutableArray",
    // strings
    "String",
    "OneByteString",
    "TwoByteString",
    "ExternalOneByteString",
    "ExternalTwoByteString",
];

// Typed data element kinds; each has TypedData / View / External cids.
const TYPED_DATA: &[&str] = &[
    "Int8Array",
    "Uint8Array",
    "Uint8ClampedArray",
    "Int16Array",
    "Uint16Array",
    "Int32Array",
    "Uint32Array",
    "Int64Array",
    "Uint64Array",
    "Float32Array",
    "Float64Array",
    "Float32x4Array",
    "Int32x4Array",
    "Float64x2Array",
];

// After typed data: byte views, FFI types, then the special types.
const TRAILING: &[&str] = &[
    "ByteDataView",
    "ByteBuffer",
    "NativeFunction",
    "FfiInt8",
    "FfiInt16",
    "FfiInt32",
    "FfiInt64",
    "FfiUint8",
    "FfiUint16",
    "FfiUint32",
    "FfiUint64",
    "FfiIntPtr",
    "FfiFloat",
    "FfiDouble",
    "FfiVoid",
    "FfiHandle",
    "Null",
    "Dynamic",
    "Void",
    "Never",
];

const PREFIX: &[&str] = &["Illegal", "NativePointer", "FreeListElement", "ForwardingCorpse", "Object"];

impl ClassId {
    pub const ILLEGAL: ClassId = ClassId(0);
    pub const OBJECT: ClassId = ClassId(4);

    pub const CLASS: ClassId = ClassId(5);
    pub const CODE: ClassId = ClassId(15);
    pub const OBJECT_POOL: ClassId = ClassId(18);
    pub const PC_DESCRIPTORS: ClassId = ClassId(19);
    pub const CODE_SOURCE_MAP: ClassId = ClassId(20);
    pub const COMPRESSED_STACK_MAPS: ClassId = ClassId(21);
    pub const LOCAL_VAR_DESCRIPTORS: ClassId = ClassId(22);
    pub const EXCEPTION_HANDLERS: ClassId = ClassId(23);
    pub const CONTEXT_SCOPE: ClassId = ClassId(25);
    pub const CALL_SITE_DATA: ClassId = ClassId(30);
    pub const ERROR: ClassId = ClassId(35);
    pub const UNWIND_ERROR: ClassId = ClassId(39);

    pub const INSTANCE: ClassId = ClassId(40);
    pub const TYPE_ARGUMENTS: ClassId = ClassId(42);
    pub const TYPE: ClassId = ClassId(44);
    pub const SMI: ClassId = ClassId(51);
    pub const MINT: ClassId = ClassId(52);
    pub const DOUBLE: ClassId = ClassId(53);
    pub const BOOL: ClassId = ClassId(54);
    pub const GROWABLE_OBJECT_ARRAY: ClassId = ClassId(55);
    pub const ARRAY: ClassId = ClassId(76);
    pub const IMMUTABLE_ARRAY: ClassId = ClassId(77);
    pub const STRING: ClassId = ClassId(78);
    pub const ONE_BYTE_STRING: ClassId = ClassId(79);
    pub const TWO_BYTE_STRING: ClassId = ClassId(80);

    pub const TYPED_DATA_START: ClassId = ClassId(83);
    pub const NULL: ClassId = ClassId(141);
    pub const DYNAMIC: ClassId = ClassId(142);
    pub const VOID: ClassId = ClassId(143);
    pub const NEVER: ClassId = ClassId(144);
    pub const NUM_PREDEFINED: ClassId = ClassId(145);

    #[inline]
    pub fn raw(self) -> i32 {
        self.0
    }

    #[inline]
    pub fn is_predefined(self) -> bool {
        self.0 >= 0 && self.0 < Self::NUM_PREDEFINED.0
    }

    #[inline]
    pub fn is_top_level(self) -> bool {
        self.0 >= TOP_LEVEL_CID_OFFSET
    }

    /// Human-readable name; `None` for user / top-level / out-of-range ids.
    pub fn name(self) -> Option<String> {
        let mut i = usize::try_from(self.0).ok()?;
        for table in [PREFIX, INTERNAL, INSTANCES] {
            if i < table.len() {
                return Some(table[i].to_string());
            }
            i -= table.len();
        }
        let typed = TYPED_DATA.len() * 3;
        if i < typed {
            let elem = TYPED_DATA[i / 3];
            return Some(match i % 3 {
                0 => format!("TypedData{elem}"),
                1 => format!("TypedDataView{elem}"),
                _ => format!("ExternalTypedData{elem}"),
            });
        }
        i -= typed;
        TRAILING.get(i).map(|s| s.to_string())
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(n) => write!(f, "{}({})", n, self.0),
            None if self.is_top_level() => write!(f, "TopLevel({})", self.0),
            None => write!(f, "cid({})", self.0),
        }
    }
}

//! Guest status codes and their symbolic names
//!
//! Used for diagnostics only. Nothing in the registry branches on a name.

use core::fmt;

/// Generic kernel failure
pub const ERROR: u32 = 0x8002_0001;
/// No object exists with the given uid
pub const UNKNOWN_UID: u32 = 0x8002_00CB;
/// The object exists but has a different kind
pub const UNMATCH_UID_TYPE: u32 = 0x8002_00CC;
pub const UNKNOWN_THID: u32 = 0x8002_0198;
pub const UNKNOWN_SEMID: u32 = 0x8002_0199;
pub const UNKNOWN_EVFID: u32 = 0x8002_019A;
pub const UNKNOWN_MBXID: u32 = 0x8002_019B;
pub const UNKNOWN_VPLID: u32 = 0x8002_019C;
pub const UNKNOWN_FPLID: u32 = 0x8002_019D;
pub const UNKNOWN_MPPID: u32 = 0x8002_019E;
pub const UNKNOWN_ALMID: u32 = 0x8002_019F;
pub const UNKNOWN_TEID: u32 = 0x8002_01A0;
pub const UNKNOWN_CBID: u32 = 0x8002_01A1;
pub const MUTEX_NO_SUCH_MUTEX: u32 = 0x8002_01C3;
pub const LWMUTEX_NO_SUCH_LWMUTEX: u32 = 0x8002_01CA;

/// Sorted by code so lookups can binary search
static NAMES: &[(u32, &str)] = &[
    (0x00000000, "ERROR_OK"),
    (0x80000020, "ALREADY"),
    (0x80000021, "BUSY"),
    (0x80000022, "OUT_OF_MEMORY"),
    (0x80000023, "PRIV_REQUIRED"),
    (0x80000100, "INVALID_ID"),
    (0x80000101, "INVALID_NAME"),
    (0x80000102, "INVALID_INDEX"),
    (0x80000103, "INVALID_POINTER"),
    (0x80000104, "INVALID_SIZE"),
    (0x80000105, "INVALID_FLAG"),
    (0x80000106, "INVALID_COMMAND"),
    (0x80000107, "INVALID_MODE"),
    (0x80000108, "INVALID_FORMAT"),
    (0x800001fe, "INVALID_VALUE"),
    (0x800001ff, "INVALID_ARGUMENT"),
    (0x80000209, "BAD_FILE"),
    (0x8000020d, "ACCESS_ERROR"),
    (0x80010002, "ERRNO_FILE_NOT_FOUND"),
    (0x80010005, "ERRNO_IO_ERROR"),
    (0x80010007, "ERRNO_ARG_LIST_TOO_LONG"),
    (0x80010009, "ERRNO_INVALID_FILE_DESCRIPTOR"),
    (0x8001000b, "ERRNO_RESOURCE_UNAVAILABLE"),
    (0x8001000c, "ERRNO_NO_MEMORY"),
    (0x8001000d, "ERRNO_NO_PERM"),
    (0x8001000e, "ERRNO_FILE_INVALID_ADDR"),
    (0x80010010, "ERRNO_DEVICE_BUSY"),
    (0x80010011, "ERRNO_FILE_ALREADY_EXISTS"),
    (0x80010012, "ERRNO_CROSS_DEV_LINK"),
    (0x80010013, "ERRNO_DEVICE_NOT_FOUND"),
    (0x80010014, "ERRNO_NOT_A_DIRECTORY"),
    (0x80010015, "ERRNO_IS_DIRECTORY"),
    (0x80010016, "ERRNO_INVALID_ARGUMENT"),
    (0x80010018, "ERRNO_TOO_MANY_OPEN_SYSTEM_FILES"),
    (0x8001001b, "ERRNO_FILE_IS_TOO_BIG"),
    (0x8001001c, "ERRNO_DEVICE_NO_FREE_SPACE"),
    (0x8001001e, "ERRNO_READ_ONLY"),
    (0x80010020, "ERRNO_CLOSED"),
    (0x80010024, "ERRNO_FILE_PATH_TOO_LONG"),
    (0x80010047, "ERRNO_FILE_PROTOCOL"),
    (0x8001005a, "ERRNO_DIRECTORY_IS_NOT_EMPTY"),
    (0x8001005c, "ERRNO_TOO_MANY_SYMBOLIC_LINKS"),
    (0x80010062, "ERRNO_FILE_ADDR_IN_USE"),
    (0x80010067, "ERRNO_CONNECTION_ABORTED"),
    (0x80010068, "ERRNO_CONNECTION_RESET"),
    (0x80010069, "ERRNO_NO_FREE_BUF_SPACE"),
    (0x8001006e, "ERRNO_FILE_TIMEOUT"),
    (0x80010077, "ERRNO_IN_PROGRESS"),
    (0x80010078, "ERRNO_ALREADY"),
    (0x8001007b, "ERRNO_NO_MEDIA"),
    (0x8001007c, "ERRNO_INVALID_MEDIUM"),
    (0x8001007d, "ERRNO_ADDRESS_NOT_AVAILABLE"),
    (0x8001007f, "ERRNO_IS_ALREADY_CONNECTED"),
    (0x80010080, "ERRNO_NOT_CONNECTED"),
    (0x80010084, "ERRNO_FILE_QUOTA_EXCEEDED"),
    (0x8001b000, "ERRNO_FUNCTION_NOT_SUPPORTED"),
    (0x8001b001, "ERRNO_ADDR_OUT_OF_MAIN_MEM"),
    (0x8001b002, "ERRNO_INVALID_UNIT_NUM"),
    (0x8001b003, "ERRNO_INVALID_FILE_SIZE"),
    (0x8001b004, "ERRNO_INVALID_FLAG"),
    (0x80020001, "ERROR"),
    (0x80020002, "NOTIMP"),
    (0x80020032, "ILLEGAL_EXPCODE"),
    (0x80020033, "EXPHANDLER_NOUSE"),
    (0x80020034, "EXPHANDLER_USED"),
    (0x80020035, "SYCALLTABLE_NOUSED"),
    (0x80020036, "SYCALLTABLE_USED"),
    (0x80020037, "ILLEGAL_SYSCALLTABLE"),
    (0x80020038, "ILLEGAL_PRIMARY_SYSCALL_NUMBER"),
    (0x80020039, "PRIMARY_SYSCALL_NUMBER_INUSE"),
    (0x80020064, "ILLEGAL_CONTEXT"),
    (0x80020065, "ILLEGAL_INTRCODE"),
    (0x80020066, "CPUDI"),
    (0x80020067, "FOUND_HANDLER"),
    (0x80020068, "NOTFOUND_HANDLER"),
    (0x80020069, "ILLEGAL_INTRLEVEL"),
    (0x8002006a, "ILLEGAL_ADDRESS"),
    (0x8002006b, "ILLEGAL_INTRPARAM"),
    (0x8002006c, "ILLEGAL_STACK_ADDRESS"),
    (0x8002006d, "ALREADY_STACK_SET"),
    (0x80020096, "NO_TIMER"),
    (0x80020097, "ILLEGAL_TIMERID"),
    (0x80020098, "ILLEGAL_SOURCE"),
    (0x80020099, "ILLEGAL_PRESCALE"),
    (0x8002009a, "TIMER_BUSY"),
    (0x8002009b, "TIMER_NOT_SETUP"),
    (0x8002009c, "TIMER_NOT_INUSE"),
    (0x800200a0, "UNIT_USED"),
    (0x800200a1, "UNIT_NOUSE"),
    (0x800200a2, "NO_ROMDIR"),
    (0x800200c8, "IDTYPE_EXIST"),
    (0x800200c9, "IDTYPE_NOT_EXIST"),
    (0x800200ca, "IDTYPE_NOT_EMPTY"),
    (0x800200cb, "UNKNOWN_UID"),
    (0x800200cc, "UNMATCH_UID_TYPE"),
    (0x800200cd, "ID_NOT_EXIST"),
    (0x800200ce, "NOT_FOUND_UIDFUNC"),
    (0x800200cf, "UID_ALREADY_HOLDER"),
    (0x800200d0, "UID_NOT_HOLDER"),
    (0x800200d1, "ILLEGAL_PERM"),
    (0x800200d2, "ILLEGAL_ARGUMENT"),
    (0x800200d3, "ILLEGAL_ADDR"),
    (0x800200d4, "OUT_OF_RANGE"),
    (0x800200d5, "MEM_RANGE_OVERLAP"),
    (0x800200d6, "ILLEGAL_PARTITION"),
    (0x800200d7, "PARTITION_INUSE"),
    (0x800200d8, "ILLEGAL_MEMBLOCKTYPE"),
    (0x800200d9, "MEMBLOCK_ALLOC_FAILED"),
    (0x800200da, "MEMBLOCK_RESIZE_LOCKED"),
    (0x800200db, "MEMBLOCK_RESIZE_FAILED"),
    (0x800200dc, "HEAPBLOCK_ALLOC_FAILED"),
    (0x800200dd, "HEAP_ALLOC_FAILED"),
    (0x800200de, "ILLEGAL_CHUNK_ID"),
    (0x800200df, "NOCHUNK"),
    (0x800200e0, "NO_FREECHUNK"),
    (0x800200e1, "MEMBLOCK_FRAGMENTED"),
    (0x800200e2, "MEMBLOCK_CANNOT_JOINT"),
    (0x800200e3, "MEMBLOCK_CANNOT_SEPARATE"),
    (0x800200e4, "ILLEGAL_ALIGNMENT_SIZE"),
    (0x800200e5, "ILLEGAL_DEVKIT_VER"),
    (0x8002012c, "LINKERR"),
    (0x8002012d, "ILLEGAL_OBJECT"),
    (0x8002012e, "UNKNOWN_MODULE"),
    (0x8002012f, "NOFILE"),
    (0x80020130, "FILEERR"),
    (0x80020131, "MEMINUSE"),
    (0x80020132, "PARTITION_MISMATCH"),
    (0x80020133, "ALREADY_STARTED"),
    (0x80020134, "NOT_STARTED"),
    (0x80020135, "ALREADY_STOPPED"),
    (0x80020136, "CAN_NOT_STOP"),
    (0x80020137, "NOT_STOPPED"),
    (0x80020138, "NOT_REMOVABLE"),
    (0x80020139, "EXCLUSIVE_LOAD"),
    (0x8002013a, "LIBRARY_NOT_YET_LINKED"),
    (0x8002013b, "LIBRARY_FOUND"),
    (0x8002013c, "LIBRARY_NOTFOUND"),
    (0x8002013d, "ILLEGAL_LIBRARY"),
    (0x8002013e, "LIBRARY_INUSE"),
    (0x8002013f, "ALREADY_STOPPING"),
    (0x80020140, "ILLEGAL_OFFSET"),
    (0x80020141, "ILLEGAL_POSITION"),
    (0x80020142, "ILLEGAL_ACCESS"),
    (0x80020143, "MODULE_MGR_BUSY"),
    (0x80020144, "ILLEGAL_FLAG"),
    (0x80020145, "CANNOT_GET_MODULELIST"),
    (0x80020146, "PROHIBIT_LOADMODULE_DEVICE"),
    (0x80020147, "PROHIBIT_LOADEXEC_DEVICE"),
    (0x80020148, "UNSUPPORTED_PRX_TYPE"),
    (0x80020149, "ILLEGAL_PERM_CALL"),
    (0x8002014a, "CANNOT_GET_MODULE_INFORMATION"),
    (0x8002014b, "ILLEGAL_LOADEXEC_BUFFER"),
    (0x8002014c, "ILLEGAL_LOADEXEC_FILENAME"),
    (0x8002014d, "NO_EXIT_CALLBACK"),
    (0x8002014e, "MEDIA_CHANGED"),
    (0x8002014f, "CANNOT_USE_BETA_VER_MODULE"),
    (0x80020190, "NO_MEMORY"),
    (0x80020191, "ILLEGAL_ATTR"),
    (0x80020192, "ILLEGAL_ENTRY"),
    (0x80020193, "ILLEGAL_PRIORITY"),
    (0x80020194, "ILLEGAL_STACK_SIZE"),
    (0x80020195, "ILLEGAL_MODE"),
    (0x80020196, "ILLEGAL_MASK"),
    (0x80020197, "ILLEGAL_THID"),
    (0x80020198, "UNKNOWN_THID"),
    (0x80020199, "UNKNOWN_SEMID"),
    (0x8002019a, "UNKNOWN_EVFID"),
    (0x8002019b, "UNKNOWN_MBXID"),
    (0x8002019c, "UNKNOWN_VPLID"),
    (0x8002019d, "UNKNOWN_FPLID"),
    (0x8002019e, "UNKNOWN_MPPID"),
    (0x8002019f, "UNKNOWN_ALMID"),
    (0x800201a0, "UNKNOWN_TEID"),
    (0x800201a1, "UNKNOWN_CBID"),
    (0x800201a2, "DORMANT"),
    (0x800201a3, "SUSPEND"),
    (0x800201a4, "NOT_DORMANT"),
    (0x800201a5, "NOT_SUSPEND"),
    (0x800201a6, "NOT_WAIT"),
    (0x800201a7, "CAN_NOT_WAIT"),
    (0x800201a8, "WAIT_TIMEOUT"),
    (0x800201a9, "WAIT_CANCEL"),
    (0x800201aa, "RELEASE_WAIT"),
    (0x800201ab, "NOTIFY_CALLBACK"),
    (0x800201ac, "THREAD_TERMINATED"),
    (0x800201ad, "SEMA_ZERO"),
    (0x800201ae, "SEMA_OVF"),
    (0x800201af, "EVF_COND"),
    (0x800201b0, "EVF_MULTI"),
    (0x800201b1, "EVF_ILPAT"),
    (0x800201b2, "MBOX_NOMSG"),
    (0x800201b3, "MPP_FULL"),
    (0x800201b4, "MPP_EMPTY"),
    (0x800201b5, "WAIT_DELETE"),
    (0x800201b6, "ILLEGAL_MEMBLOCK"),
    (0x800201b7, "ILLEGAL_MEMSIZE"),
    (0x800201b8, "ILLEGAL_SPADADDR"),
    (0x800201b9, "SPAD_INUSE"),
    (0x800201ba, "SPAD_NOT_INUSE"),
    (0x800201bb, "ILLEGAL_TYPE"),
    (0x800201bc, "ILLEGAL_SIZE"),
    (0x800201bd, "ILLEGAL_COUNT"),
    (0x800201be, "UNKNOWN_VTID"),
    (0x800201bf, "ILLEGAL_VTID"),
    (0x800201c0, "ILLEGAL_KTLSID"),
    (0x800201c1, "KTLS_FULL"),
    (0x800201c2, "KTLS_BUSY"),
    (0x800201c3, "MUTEX_NO_SUCH_MUTEX"),
    (0x800201c9, "MESSAGEBOX_DUPLICATE_MESSAGE"),
    (0x800201ca, "LWMUTEX_NO_SUCH_LWMUTEX"),
    (0x80020258, "PM_INVALID_PRIORITY"),
    (0x80020259, "PM_INVALID_DEVNAME"),
    (0x8002025a, "PM_UNKNOWN_DEVNAME"),
    (0x8002025b, "PM_PMINFO_REGISTERED"),
    (0x8002025c, "PM_PMINFO_UNREGISTERED"),
    (0x8002025d, "PM_INVALID_MAJOR_STATE"),
    (0x8002025e, "PM_INVALID_REQUEST"),
    (0x8002025f, "PM_UNKNOWN_REQUEST"),
    (0x80020260, "PM_INVALID_UNIT"),
    (0x80020261, "PM_CANNOT_CANCEL"),
    (0x80020262, "PM_INVALID_PMINFO"),
    (0x80020263, "PM_INVALID_ARGUMENT"),
    (0x80020264, "PM_ALREADY_TARGET_PWRSTATE"),
    (0x80020265, "PM_CHANGE_PWRSTATE_FAILED"),
    (0x80020266, "PM_CANNOT_CHANGE_DEVPWR_STATE"),
    (0x80020267, "PM_NO_SUPPORT_DEVPWR_STATE"),
    (0x800202bc, "DMAC_REQUEST_FAILED"),
    (0x800202bd, "DMAC_REQUEST_DENIED"),
    (0x800202be, "DMAC_OP_QUEUED"),
    (0x800202bf, "DMAC_OP_NOT_QUEUED"),
    (0x800202c0, "DMAC_OP_RUNNING"),
    (0x800202c1, "DMAC_OP_NOT_ASSIGNED"),
    (0x800202c2, "DMAC_OP_TIMEOUT"),
    (0x800202c3, "DMAC_OP_FREED"),
    (0x800202c4, "DMAC_OP_USED"),
    (0x800202c5, "DMAC_OP_EMPTY"),
    (0x800202c6, "DMAC_OP_ABORTED"),
    (0x800202c7, "DMAC_OP_ERROR"),
    (0x800202c8, "DMAC_CHANNEL_RESERVED"),
    (0x800202c9, "DMAC_CHANNEL_EXCLUDED"),
    (0x800202ca, "DMAC_PRIVILEGE_ADDRESS"),
    (0x800202cb, "DMAC_NO_ENOUGHSPACE"),
    (0x800202cc, "DMAC_CHANNEL_NOT_ASSIGNED"),
    (0x800202cd, "DMAC_CHILD_OPERATION"),
    (0x800202ce, "DMAC_TOO_MUCH_SIZE"),
    (0x800202cf, "DMAC_INVALID_ARGUMENT"),
    (0x80020320, "MFILE"),
    (0x80020321, "NODEV"),
    (0x80020322, "XDEV"),
    (0x80020323, "BADF"),
    (0x80020324, "INVAL"),
    (0x80020325, "UNSUP"),
    (0x80020326, "ALIAS_USED"),
    (0x80020327, "CANNOT_MOUNT"),
    (0x80020328, "DRIVER_DELETED"),
    (0x80020329, "ASYNC_BUSY"),
    (0x8002032a, "NOASYNC"),
    (0x8002032b, "REGDEV"),
    (0x8002032c, "NOCWD"),
    (0x8002032d, "NAMETOOLONG"),
    (0x800203e8, "NXIO"),
    (0x800203e9, "IO"),
    (0x800203ea, "NOMEM"),
    (0x800203eb, "STDIO_NOT_OPENED"),
    (0x8002044c, "CACHE_ALIGNMENT"),
    (0x8002044d, "ERRORMAX"),
];

/// Symbolic name of a guest status code, if known
pub fn error_name(code: u32) -> Option<&'static str> {
    NAMES
        .binary_search_by_key(&code, |&(value, _)| value)
        .ok()
        .map(|index| NAMES[index].1)
}

/// Number of named status codes
pub fn known_count() -> usize {
    NAMES.len()
}

/// A status code that formats as `0x80020001 (ERROR)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u32);

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match error_name(self.0) {
            Some(name) => write!(f, "{:#010x} ({})", self.0, name),
            None => write!(f, "{:#010x}", self.0),
        }
    }
}

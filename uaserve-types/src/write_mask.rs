//! The [`WriteMask`] bitflags, indicating which attributes of a node a
//! client may write.

use bitflags::bitflags;

bitflags! {
    /// Bit mask of the attributes of a node that are writable through the
    /// Write service. The Value attribute of variables is governed by the
    /// access level instead.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct WriteMask: u32 {
        /// The AccessLevel attribute is writable.
        const ACCESS_LEVEL = 1;
        /// The ArrayDimensions attribute is writable.
        const ARRAY_DIMENSIONS = 1 << 1;
        /// The BrowseName attribute is writable.
        const BROWSE_NAME = 1 << 2;
        /// The ContainsNoLoops attribute is writable.
        const CONTAINS_NO_LOOPS = 1 << 3;
        /// The DataType attribute is writable.
        const DATA_TYPE = 1 << 4;
        /// The Description attribute is writable.
        const DESCRIPTION = 1 << 5;
        /// The DisplayName attribute is writable.
        const DISPLAY_NAME = 1 << 6;
        /// The EventNotifier attribute is writable.
        const EVENT_NOTIFIER = 1 << 7;
        /// The Executable attribute is writable.
        const EXECUTABLE = 1 << 8;
        /// The Historizing attribute is writable.
        const HISTORIZING = 1 << 9;
        /// The InverseName attribute is writable.
        const INVERSE_NAME = 1 << 10;
        /// The IsAbstract attribute is writable.
        const IS_ABSTRACT = 1 << 11;
        /// The MinimumSamplingInterval attribute is writable.
        const MINIMUM_SAMPLING_INTERVAL = 1 << 12;
        /// The NodeClass attribute is writable.
        const NODE_CLASS = 1 << 13;
        /// The NodeId attribute is writable.
        const NODE_ID = 1 << 14;
        /// The Symmetric attribute is writable.
        const SYMMETRIC = 1 << 15;
        /// The UserAccessLevel attribute is writable.
        const USER_ACCESS_LEVEL = 1 << 16;
        /// The UserExecutable attribute is writable.
        const USER_EXECUTABLE = 1 << 17;
        /// The UserWriteMask attribute is writable.
        const USER_WRITE_MASK = 1 << 18;
        /// The ValueRank attribute is writable.
        const VALUE_RANK = 1 << 19;
        /// The WriteMask attribute is writable.
        const WRITE_MASK = 1 << 20;
        /// The Value attribute is writable, for variable types only.
        const VALUE_FOR_VARIABLE_TYPE = 1 << 21;
    }
}

//! Generated protobuf types and the `LibraryService` tonic server.

pub mod library {
    #![allow(clippy::pedantic)]
    tonic::include_proto!("library.v1");
}

/// Encoded descriptor set for gRPC reflection.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("library_descriptor");

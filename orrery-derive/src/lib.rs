//! Derive macros for the Orrery renderer.
//!
//! This crate provides one derive macro, [`Vertex`], which describes how a
//! plain `#[repr(C)]` struct is laid out in a GPU vertex buffer.
//!
//! # Usage
//!
//! The macro is re-exported from the main `orrery` crate. You don't need
//! to add this crate directly:
//!
//! ```ignore
//! use orrery::{Vertex, VertexLayout};
//!
//! #[repr(C)]
//! #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Vertex)]
//! struct LineVertex {
//!     position: [f32; 3],
//!     color: [f32; 4],
//! }
//!
//! let layout = LineVertex::buffer_layout();
//! ```
//!
//! # Generated Items
//!
//! - `ATTRIBUTES`: one `wgpu::VertexAttribute` per field, with shader
//!   locations assigned in declaration order and tightly packed offsets
//! - `WGSL_INPUT`: a WGSL `VertexInput` struct matching those locations,
//!   so shaders never restate the layout by hand
//!
//! ## Supported Field Types
//!
//! `f32`, `u32`, `[f32; 2]`, `[f32; 3]`, `[f32; 4]`, `Vec2`, `Vec3`, `Vec4`.
//! Offsets are packed in declaration order. That matches the `#[repr(C)]`
//! layout for every type except glam's `Vec4`, which is 16-byte aligned on
//! SIMD targets; prefer `[f32; 4]` unless it comes first.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Type};

/// Derive macro for vertex buffer layouts.
///
/// Implements `orrery::VertexLayout` for a struct with named fields.
///
/// # Panics
///
/// At compile time, if used on anything but a struct with named fields or
/// if a field has an unsupported type.
#[proc_macro_derive(Vertex)]
pub fn derive_vertex(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("Vertex derive only supports structs with named fields"),
        },
        _ => panic!("Vertex derive only supports structs"),
    };

    let mut attributes = Vec::new();
    let mut wgsl_fields = Vec::new();
    let mut offset: u64 = 0;

    for (location, field) in fields.iter().enumerate() {
        let field_name = field
            .ident
            .as_ref()
            .map(|ident| ident.to_string())
            .unwrap_or_default();
        let info = attribute_info(&field.ty);
        let format = info.format;
        let location = location as u32;

        attributes.push(quote! {
            ::orrery::wgpu::VertexAttribute {
                format: ::orrery::wgpu::VertexFormat::#format,
                offset: #offset,
                shader_location: #location,
            }
        });
        wgsl_fields.push(format!(
            "    @location({}) {}: {},",
            location, field_name, info.wgsl_type
        ));

        offset += info.size;
    }

    let wgsl = format!("struct VertexInput {{\n{}\n}}\n", wgsl_fields.join("\n"));

    let expanded = quote! {
        impl ::orrery::VertexLayout for #name {
            const ATTRIBUTES: &'static [::orrery::wgpu::VertexAttribute] = &[
                #(#attributes),*
            ];
            const WGSL_INPUT: &'static str = #wgsl;
        }
    };

    TokenStream::from(expanded)
}

/// Vertex format, WGSL type and byte size of one supported field type.
struct AttributeInfo {
    format: proc_macro2::Ident,
    wgsl_type: &'static str,
    size: u64,
}

fn attribute_info(ty: &Type) -> AttributeInfo {
    let type_str = quote!(#ty).to_string().replace(' ', "");

    let (format, wgsl_type, size) = match type_str.as_str() {
        "f32" => ("Float32", "f32", 4),
        "u32" => ("Uint32", "u32", 4),
        "[f32;2]" | "Vec2" | "glam::Vec2" => ("Float32x2", "vec2<f32>", 8),
        "[f32;3]" | "Vec3" | "glam::Vec3" => ("Float32x3", "vec3<f32>", 12),
        "[f32;4]" | "Vec4" | "glam::Vec4" => ("Float32x4", "vec4<f32>", 16),
        _ => panic!("Unsupported type in Vertex struct: {}", type_str),
    };

    AttributeInfo {
        format: proc_macro2::Ident::new(format, proc_macro2::Span::call_site()),
        wgsl_type,
        size,
    }
}

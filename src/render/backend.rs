/// An external rendering engine bound to one surface.
///
/// Engine-side state lives outside Rust's ownership (GPU memory, a wasm
/// heap object, a native context), so it is released by an explicit
/// [`dispose`](RenderEngine::dispose) rather than by dropping the value.
/// Callers never talk to an engine directly; they go through
/// [`EngineHandle`](crate::engine::EngineHandle), which guarantees `dispose`
/// runs exactly once and that nothing renders afterwards.
pub trait RenderEngine: 'static {
    /// Name of the engine, used in logs.
    fn name(&self) -> &str;

    /// Draw one frame into the bound surface.
    fn render(&mut self) -> anyhow::Result<()>;

    /// Release engine-side resources. Must tolerate being the only call ever
    /// made on the engine.
    fn dispose(&mut self);
}

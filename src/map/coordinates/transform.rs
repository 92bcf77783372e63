use std::marker::PhantomData;

use super::XY;

/// A typed scale-then-translate transform from canvas coordinates `F` to screen positions `T`.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct TTransform<F: XY, T: XY> {
  pub zoom: f32,
  pub trans: T,
  phantom_data: PhantomData<F>,
}

impl<F: XY, T: XY> Default for TTransform<F, T> {
  fn default() -> Self {
    Self {
      zoom: 1.,
      trans: T::default(),
      phantom_data: PhantomData,
    }
  }
}

/// Converts between two coordinate kinds without exposing a public `From`.
pub trait PrivateInto<T> {
  fn conv(self) -> T;
}

impl<F: XY, T: XY> PrivateInto<T> for F {
  fn conv(self) -> T {
    T::default().with_x(self.x()).with_y(self.y())
  }
}

impl<F: XY, T: XY> TTransform<F, T>
where
  F: PrivateInto<T>,
  T: PrivateInto<F>,
{
  #[must_use]
  pub fn zoomed(mut self, factor: f32) -> Self {
    self.zoom(factor);
    self
  }

  pub fn zoom(&mut self, factor: f32) -> &mut Self {
    self.zoom *= factor;
    self
  }

  pub fn translate(&mut self, delta: T) -> &mut Self {
    self.trans += delta;
    self
  }

  #[must_use]
  pub fn translated(mut self, delta: T) -> Self {
    self.translate(delta);
    self
  }

  /// The inverse transform, mapping screen positions back onto the canvas.
  #[must_use]
  pub fn invert(self) -> TTransform<T, F> {
    TTransform {
      zoom: 1. / self.zoom,
      trans: self.trans.conv() * (-1. / self.zoom),
      phantom_data: PhantomData,
    }
  }

  pub fn apply(&self, from: F) -> T {
    (from * self.zoom).conv() + self.trans
  }
}

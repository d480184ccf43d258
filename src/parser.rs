use nom::character::complete::{char, digit1};
use nom::combinator::{all_consuming, map_res, opt, recognize};
use nom::error::{convert_error, VerboseError};
use nom::sequence::pair;
use nom::IResult;

use crate::error::Error;

pub type NomResult<'a, Ret> = IResult<&'a str, Ret, VerboseError<&'a str>>;

pub fn natural(input: &str) -> NomResult<u64> {
    map_res(digit1, |digit_str: &str| digit_str.parse::<u64>())(input)
}

pub fn integer(input: &str) -> NomResult<i32> {
    map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| s.parse::<i32>())(input)
}

pub fn parse_exact<Ret, Parser: Fn(&str) -> NomResult<Ret>>(parser: Parser, input: &str) -> NomResult<Ret> {
    all_consuming(parser)(input)
}

/// Runs `parser` over the whole of `input`, reporting failures against `line`.
pub fn parse_line<Ret, Parser: Fn(&str) -> NomResult<Ret>>(parser: Parser, input: &str, line: usize) -> Result<Ret, Error> {
    match parse_exact(parser, input) {
        Ok((_, value)) => Ok(value),
        Err(nom::Err::Incomplete(_)) => Err(Error::parse(line, "incomplete input")),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(Error::parse(line, convert_error(input, e))),
    }
}
